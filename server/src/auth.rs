use axum::http::{HeaderMap, header::AUTHORIZATION};

use corkboard_core::user::UserRecord;

use crate::{error::AppError, state::AppState};

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let mut segments = value.split_whitespace();
    let scheme = segments.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = segments.next()?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_owned())
}

/// Resolves the bearer token to a signed-in user. Expired sessions look the
/// same as missing ones.
pub(crate) async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<UserRecord, AppError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(AppError::unauthorized("authentication required"));
    };

    let Some(session) = state
        .user_store
        .find_auth_session(&token)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::unauthorized("invalid or expired session"));
    };

    state
        .user_store
        .find_by_id(session.user_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::unauthorized("invalid or expired session"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("BEARER abc-123"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn empty_tokens_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
