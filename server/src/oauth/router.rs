use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState, types::UserResponse};

use super::OAuthState;

pub fn oauth_router() -> Router<AppState> {
    Router::new()
        .route("/oauth/login", post(oauth_login_handler))
        .route("/oauth/callback", get(oauth_callback_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthLoginRequest {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
}

#[derive(Serialize)]
pub struct OAuthLoginResponse {
    pub url: String,
}

#[derive(Deserialize)]
struct OAuthCallbackQuery {
    code: String,
    state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCallbackResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

async fn oauth_login_handler(
    State(state): State<AppState>,
    Json(payload): Json<OAuthLoginRequest>,
) -> Result<Json<OAuthLoginResponse>, AppError> {
    let Some(provider) = state.oauth.provider() else {
        return Err(no_oauth_provider());
    };

    if let Some(requested) = payload.provider.as_deref() {
        if requested != provider.name() {
            return Err(AppError::bad_request(format!(
                "unknown oauth provider {requested}"
            ))
            .with_name("UNKNOWN_OAUTH_PROVIDER"));
        }
    }

    let redirect_uri = sanitize_redirect(payload.redirect_uri.as_deref())?;
    let state_token = state.oauth.issue_state(OAuthState { redirect_uri }).await;
    let url = provider.authorization_url(&state_token)?;

    Ok(Json(OAuthLoginResponse { url }))
}

async fn oauth_callback_handler(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Json<OAuthCallbackResponse>, AppError> {
    let Some(provider) = state.oauth.provider() else {
        return Err(no_oauth_provider());
    };

    let Some(stored_state) = state.oauth.get_state(&query.state).await else {
        return Err(AppError::bad_request("oauth state expired").with_name("OAUTH_STATE_EXPIRED"));
    };

    let tokens = provider.exchange_code(&query.code).await?;
    let account = provider.fetch_account(&tokens).await?;

    let user = state
        .user_store
        .find_or_create_by_email(&account.email, account.name.as_deref())
        .await
        .map_err(AppError::from_anyhow)?;

    let session = state
        .user_store
        .create_auth_session(user.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;

    state.oauth.invalidate_state(&query.state).await;

    Ok(Json(OAuthCallbackResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
        redirect_uri: stored_state.redirect_uri,
    }))
}

fn sanitize_redirect(value: Option<&str>) -> Result<Option<String>, AppError> {
    if let Some(raw) = value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.starts_with('/') {
            return Ok(Some(trimmed.to_string()));
        }
        return Err(
            AppError::bad_request("redirectUri must be a relative path")
                .with_name("INVALID_OAUTH_REDIRECT"),
        );
    }
    Ok(None)
}

fn no_oauth_provider() -> AppError {
    AppError::bad_request("no oauth provider configured").with_name("NO_OAUTH_PROVIDER")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_redirect_accepts_relative_paths() {
        let value = sanitize_redirect(Some("/boards")).expect("sanitize ok");
        assert_eq!(value.as_deref(), Some("/boards"));
    }

    #[test]
    fn sanitize_redirect_rejects_absolute_urls() {
        let err =
            sanitize_redirect(Some("https://example.com")).expect_err("absolute url rejected");
        assert_eq!(err.into_payload().1.name, "INVALID_OAUTH_REDIRECT");
    }

    #[test]
    fn sanitize_redirect_treats_blank_as_absent() {
        assert!(sanitize_redirect(Some("   ")).unwrap().is_none());
    }
}
