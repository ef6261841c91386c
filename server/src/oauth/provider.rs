use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct OAuthAccount {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn authorization_url(&self, state_token: &str) -> Result<String, AppError>;

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, AppError>;

    async fn fetch_account(&self, tokens: &OAuthTokens) -> Result<OAuthAccount, AppError>;
}

/// Generic OIDC provider driven entirely by environment configuration.
#[derive(Clone, Debug)]
pub struct OidcProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub scope: String,
}

impl OidcProviderConfig {
    pub fn from_env() -> Option<Self> {
        let client_id = non_empty_env("CORKBOARD_OAUTH_CLIENT_ID")?;
        let client_secret = non_empty_env("CORKBOARD_OAUTH_CLIENT_SECRET")?;
        let authorization_endpoint = non_empty_env("CORKBOARD_OAUTH_AUTHORIZE_URL")?;
        let token_endpoint = non_empty_env("CORKBOARD_OAUTH_TOKEN_URL")?;
        let userinfo_endpoint = non_empty_env("CORKBOARD_OAUTH_USERINFO_URL")?;
        let scope = non_empty_env("CORKBOARD_OAUTH_SCOPE")
            .unwrap_or_else(|| "openid email profile".to_owned());

        Some(Self {
            client_id,
            client_secret,
            authorization_endpoint,
            token_endpoint,
            userinfo_endpoint,
            scope,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().to_owned();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

pub struct OidcOAuthProvider {
    client: Client,
    config: OidcProviderConfig,
    redirect_uri: String,
}

impl OidcOAuthProvider {
    pub fn new(client: Client, config: OidcProviderConfig, redirect_uri: String) -> Self {
        Self {
            client,
            config,
            redirect_uri,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl OAuthProvider for OidcOAuthProvider {
    fn name(&self) -> &'static str {
        "oidc"
    }

    fn authorization_url(&self, state_token: &str) -> Result<String, AppError> {
        let mut url = Url::parse(&self.config.authorization_endpoint)
            .map_err(|err| AppError::internal(err.into()))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.redirect_uri);
            query.append_pair("scope", &self.config.scope);
            query.append_pair("state", state_token);
        }

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, AppError> {
        let body = serde_urlencoded::to_string([
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .map_err(|err| AppError::internal(err.into()))?;

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| AppError::internal(err.into()))?;

        if !response.status().is_success() {
            return Err(AppError::bad_request("oauth code exchange failed")
                .with_name("OAUTH_CODE_EXCHANGE_FAILED"));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::internal(err.into()))?;

        let expires_at = tokens
            .expires_in
            .map(|seconds| chrono::Utc::now().timestamp() + seconds);

        Ok(OAuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at,
        })
    }

    async fn fetch_account(&self, tokens: &OAuthTokens) -> Result<OAuthAccount, AppError> {
        let response = self
            .client
            .get(&self.config.userinfo_endpoint)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|err| AppError::internal(err.into()))?;

        if !response.status().is_success() {
            return Err(AppError::bad_request("oauth userinfo request failed")
                .with_name("OAUTH_USERINFO_FAILED"));
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|err| AppError::internal(err.into()))?;

        let email = info.email.ok_or_else(|| {
            AppError::bad_request("oauth provider did not return an email")
                .with_name("OAUTH_EMAIL_MISSING")
        })?;

        Ok(OAuthAccount {
            id: info.sub,
            email,
            name: info.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> OidcOAuthProvider {
        OidcOAuthProvider::new(
            Client::new(),
            OidcProviderConfig {
                client_id: "board-client".into(),
                client_secret: "secret".into(),
                authorization_endpoint: "https://idp.local/authorize".into(),
                token_endpoint: "https://idp.local/token".into(),
                userinfo_endpoint: "https://idp.local/userinfo".into(),
                scope: "openid email profile".into(),
            },
            "http://127.0.0.1:8082/oauth/callback".into(),
        )
    }

    #[test]
    fn authorization_url_carries_state_and_redirect() {
        let url = test_provider()
            .authorization_url("state-token")
            .expect("build authorization url");
        assert!(url.starts_with("https://idp.local/authorize?"));
        assert!(url.contains("client_id=board-client"));
        assert!(url.contains("state=state-token"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8082%2Foauth%2Fcallback"));
    }

    #[test]
    fn authorization_url_preserves_existing_query_parameters() {
        let mut provider = test_provider();
        provider.config.authorization_endpoint = "https://idp.local/authorize?tenant=board".into();

        let url = provider
            .authorization_url("state-token")
            .expect("build authorization url");
        let parsed = Url::parse(&url).expect("well formed url");
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert!(pairs.contains(&("tenant".into(), "board".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
    }

    #[test]
    fn malformed_authorization_endpoints_are_rejected() {
        let mut provider = test_provider();
        provider.config.authorization_endpoint = "not a url".into();

        let err = provider
            .authorization_url("state-token")
            .expect_err("invalid endpoint rejected");
        assert_eq!(
            err.into_payload().0,
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
