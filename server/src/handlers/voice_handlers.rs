use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::LOCATION},
};

use crate::{
    auth::authenticate,
    error::AppError,
    state::AppState,
    types::{MoveVoiceQuery, VoiceMemberRequest, VoiceParticipantResponse, VoiceSessionResponse},
};

pub async fn start_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<VoiceSessionResponse>), AppError>
{
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let session = state.voice_service.start_session(&workspace_id).await?;
    let location = format!(
        "/workspaces/{workspace_id}/voice/{}",
        session.id.as_str()
    );

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(session.into()),
    ))
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
) -> Result<Json<VoiceSessionResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let session = state
        .voice_service
        .fetch_session(&workspace_id, &session_id)
        .await?;
    Ok(Json(session.into()))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
) -> Result<Json<VoiceSessionResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let session = state
        .voice_service
        .end_session(&workspace_id, &session_id)
        .await?;
    Ok(Json(session.into()))
}

pub async fn list_sessions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<VoiceSessionResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let sessions = state.voice_service.list_sessions(&workspace_id).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

pub async fn join_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
    Json(payload): Json<VoiceMemberRequest>,
) -> Result<
    (StatusCode, [(axum::http::HeaderName, String); 1], Json<VoiceParticipantResponse>),
    AppError,
> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let member_id = payload.workspace_user_id()?.to_owned();
    let participant = state
        .voice_service
        .join(&workspace_id, &session_id, &member_id)
        .await?;

    let location =
        format!("/workspaces/{workspace_id}/voice/{session_id}/users/{member_id}");

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(participant.into()),
    ))
}

pub async fn leave_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id, member_id)): Path<(String, String, String)>,
) -> Result<Json<VoiceParticipantResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let participant = state
        .voice_service
        .leave(&workspace_id, &session_id, &member_id)
        .await?;
    Ok(Json(participant.into()))
}

pub async fn move_member_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
    Query(query): Query<MoveVoiceQuery>,
    Json(payload): Json<VoiceMemberRequest>,
) -> Result<Json<VoiceParticipantResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let member_id = payload.workspace_user_id()?.to_owned();
    let from_session_id = query.from_session_id.unwrap_or_else(|| session_id.clone());
    let to_session_id = query
        .to_session_id
        .ok_or_else(|| AppError::missing_field("toSessionId"))?;

    let participant = state
        .voice_service
        .move_member(&workspace_id, &from_session_id, &to_session_id, &member_id)
        .await?;
    Ok(Json(participant.into()))
}

pub async fn list_active_participants_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
) -> Result<Json<Vec<VoiceParticipantResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let participants = state
        .voice_service
        .list_active_participants(&workspace_id, &session_id)
        .await?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

pub async fn list_all_participants_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
) -> Result<Json<Vec<VoiceParticipantResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let participants = state
        .voice_service
        .list_all_participants(&workspace_id, &session_id)
        .await?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

pub async fn count_active_participants_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, session_id)): Path<(String, String)>,
) -> Result<Json<i64>, AppError> {
    let user = authenticate(&state, &headers).await?;
    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;

    let count = state
        .voice_service
        .count_active_participants(&workspace_id, &session_id)
        .await?;
    Ok(Json(count))
}
