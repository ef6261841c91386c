use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

use corkboard_core::canvas::{CanvasRecord, IdeaChanges, IdeaRecord};

use crate::{
    auth::authenticate,
    error::AppError,
    realtime::{EVENT_IDEA_CREATED, EVENT_IDEA_DELETED, EVENT_IDEA_UPDATED, canvas_topic},
    state::AppState,
    types::{CanvasResponse, CreateCanvasRequest, CreateIdeaRequest, IdeaResponse, UpdateIdeaRequest},
};

pub async fn create_canvas_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
    Json(payload): Json<CreateCanvasRequest>,
) -> Result<(StatusCode, Json<CanvasResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::missing_field("title"));
    }

    let canvas = state
        .canvas_store
        .create_canvas(&workspace_id, title)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(canvas.into())))
}

pub async fn list_canvases_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<CanvasResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let canvases = state
        .canvas_store
        .list_canvases(&workspace_id)
        .await
        .map_err(AppError::from_anyhow)?;
    Ok(Json(canvases.into_iter().map(Into::into).collect()))
}

pub async fn get_canvas_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id)): Path<(String, String)>,
) -> Result<Json<CanvasResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let canvas = fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;
    Ok(Json(canvas.into()))
}

pub async fn delete_canvas_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;
    state
        .canvas_store
        .delete_canvas(&canvas_id)
        .await
        .map_err(AppError::from_anyhow)?;
    state.notifications.remove_topic(&canvas_topic(&canvas_id));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_idea_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id)): Path<(String, String)>,
    Json(payload): Json<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<IdeaResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;
    let member = state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;

    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::missing_field("text"));
    }

    let idea = state
        .canvas_store
        .create_idea(
            &canvas_id,
            member.id.as_str(),
            text,
            payload.x,
            payload.y,
            payload.color.as_deref(),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    let response = IdeaResponse::from(idea);
    state.notifications.broadcast(
        &canvas_topic(&canvas_id),
        EVENT_IDEA_CREATED,
        serde_json::to_value(&response).unwrap_or_default(),
    );

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_ideas_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id)): Path<(String, String)>,
) -> Result<Json<Vec<IdeaResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;

    let ideas = state
        .canvas_store
        .list_ideas(&canvas_id)
        .await
        .map_err(AppError::from_anyhow)?;
    Ok(Json(ideas.into_iter().map(Into::into).collect()))
}

pub async fn update_idea_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id, idea_id)): Path<(String, String, String)>,
    Json(payload): Json<UpdateIdeaRequest>,
) -> Result<Json<IdeaResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;
    fetch_idea_scoped(&state, &canvas_id, &idea_id).await?;

    let changes = IdeaChanges {
        text: payload.text,
        x: payload.x,
        y: payload.y,
        color: payload.color,
    };

    let idea = state
        .canvas_store
        .update_idea(&idea_id, changes)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::idea_not_found(&idea_id))?;

    let response = IdeaResponse::from(idea);
    state.notifications.broadcast(
        &canvas_topic(&canvas_id),
        EVENT_IDEA_UPDATED,
        serde_json::to_value(&response).unwrap_or_default(),
    );

    Ok(Json(response))
}

pub async fn delete_idea_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, canvas_id, idea_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    fetch_canvas_scoped(&state, &workspace_id, &canvas_id).await?;
    fetch_idea_scoped(&state, &canvas_id, &idea_id).await?;

    state
        .canvas_store
        .delete_idea(&idea_id)
        .await
        .map_err(AppError::from_anyhow)?;
    state.notifications.broadcast(
        &canvas_topic(&canvas_id),
        EVENT_IDEA_DELETED,
        serde_json::json!({ "id": idea_id, "canvasId": canvas_id }),
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_canvas_scoped(
    state: &AppState,
    workspace_id: &str,
    canvas_id: &str,
) -> Result<CanvasRecord, AppError> {
    let canvas = state
        .canvas_store
        .find_canvas(canvas_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::canvas_not_found(canvas_id))?;

    // Canvases from other workspaces are invisible, not forbidden.
    if canvas.workspace_id.as_str() != workspace_id {
        return Err(AppError::canvas_not_found(canvas_id));
    }

    Ok(canvas)
}

async fn fetch_idea_scoped(
    state: &AppState,
    canvas_id: &str,
    idea_id: &str,
) -> Result<IdeaRecord, AppError> {
    let idea = state
        .canvas_store
        .find_idea(idea_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::idea_not_found(idea_id))?;

    if idea.canvas_id.as_str() != canvas_id {
        return Err(AppError::idea_not_found(idea_id));
    }

    Ok(idea)
}

#[cfg(test)]
mod tests {
    use crate::{
        realtime::{EVENT_IDEA_DELETED, EVENT_IDEA_UPDATED, canvas_topic},
        router::build_router,
        state::AppState,
        test_support::{bearer_for, seed_workspace, setup_state},
    };
    use axum::{
        body::Body,
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
    };
    use corkboard_core::canvas::{CanvasRecord, IdeaRecord};
    use serde_json::json;
    use tower::ServiceExt;

    async fn seed_idea(state: &AppState, workspace_id: &str, member_id: &str) -> (CanvasRecord, IdeaRecord) {
        let canvas = state
            .canvas_store
            .create_canvas(workspace_id, "Brainstorm")
            .await
            .expect("create canvas");
        let idea = state
            .canvas_store
            .create_idea(canvas.id.as_str(), member_id, "draft", 0.0, 0.0, None)
            .await
            .expect("create idea");
        (canvas, idea)
    }

    #[tokio::test]
    async fn idea_updates_broadcast_on_the_canvas_topic() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, workspace, member) = seed_workspace(&state).await;
        let (canvas, idea) = seed_idea(&state, workspace.id.as_str(), member.id.as_str()).await;

        let mut events = state.notifications.subscribe(&canvas_topic(canvas.id.as_str()));
        let token = bearer_for(&state, &user).await;
        let app = build_router(state.clone());

        let request = Request::builder()
            .method("PATCH")
            .uri(format!(
                "/workspaces/{}/canvases/{}/ideas/{}",
                workspace.id.as_str(),
                canvas.id.as_str(),
                idea.id
            ))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "text": "refined" }).to_string()))
            .expect("build request");

        let response = app.oneshot(request).await.expect("patch response");
        assert_eq!(response.status(), StatusCode::OK);

        let event = events.recv().await.expect("event delivered");
        assert_eq!(event.event, EVENT_IDEA_UPDATED);
        assert_eq!(event.payload["id"], idea.id);
        assert_eq!(event.payload["text"], "refined");
    }

    #[tokio::test]
    async fn idea_deletions_broadcast_on_the_canvas_topic() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, workspace, member) = seed_workspace(&state).await;
        let (canvas, idea) = seed_idea(&state, workspace.id.as_str(), member.id.as_str()).await;

        let mut events = state.notifications.subscribe(&canvas_topic(canvas.id.as_str()));
        let token = bearer_for(&state, &user).await;
        let app = build_router(state.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri(format!(
                "/workspaces/{}/canvases/{}/ideas/{}",
                workspace.id.as_str(),
                canvas.id.as_str(),
                idea.id
            ))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("build request");

        let response = app.oneshot(request).await.expect("delete response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let event = events.recv().await.expect("event delivered");
        assert_eq!(event.event, EVENT_IDEA_DELETED);
        assert_eq!(event.payload["id"], idea.id);
        assert_eq!(event.payload["canvasId"], canvas.id.as_str());
    }
}
