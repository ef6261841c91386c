use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{
    auth::{authenticate, extract_bearer_token},
    error::AppError,
    state::AppState,
    types::UserResponse,
};

pub async fn current_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    Ok(Json(user.into()))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    authenticate(&state, &headers).await?;

    if let Some(token) = extract_bearer_token(&headers) {
        state
            .user_store
            .delete_auth_session(&token)
            .await
            .map_err(AppError::from_anyhow)?;
    }

    Ok(StatusCode::NO_CONTENT)
}
