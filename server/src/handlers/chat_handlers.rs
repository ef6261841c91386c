use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    auth::authenticate,
    error::AppError,
    realtime::{EVENT_CHAT_MESSAGE, workspace_topic},
    state::AppState,
    types::{ChatHistoryQuery, ChatMessageResponse, PostChatMessageRequest},
};

pub async fn post_chat_message_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
    Json(payload): Json<PostChatMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessageResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;
    let member = state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let body = payload.body.trim();
    if body.is_empty() {
        return Err(AppError::missing_field("body"));
    }

    let posted = state
        .chat_store
        .post(&workspace_id, member.id.as_str(), body)
        .await
        .map_err(AppError::from_anyhow)?;

    let message = state
        .chat_store
        .find_with_author(&posted.id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| {
            AppError::internal(anyhow::anyhow!("chat message {} vanished after insert", posted.id))
        })?;

    let response = ChatMessageResponse::from(message);
    state.notifications.broadcast(
        &workspace_topic(&workspace_id),
        EVENT_CHAT_MESSAGE,
        serde_json::to_value(&response).unwrap_or_default(),
    );

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_chat_messages_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<Vec<ChatMessageResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let messages = state
        .chat_store
        .list(&workspace_id, query.limit)
        .await
        .map_err(AppError::from_anyhow)?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}
