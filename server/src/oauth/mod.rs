mod provider;
mod router;
mod state_store;

use std::{sync::Arc, time::Duration};

use once_cell::sync::Lazy;
use reqwest::Client;
use url::Url;

pub use provider::{OAuthAccount, OAuthProvider, OAuthTokens, OidcOAuthProvider, OidcProviderConfig};
pub use router::{OAuthCallbackResponse, OAuthLoginResponse, oauth_router};
pub use state_store::OAuthState;

use self::state_store::OAuthStateStore;

const OAUTH_STATE_TTL: Duration = Duration::from_secs(10 * 60);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(format!("corkboard-server/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("build oauth http client")
});

#[derive(Clone)]
pub struct OAuthService {
    provider: Option<Arc<dyn OAuthProvider>>,
    state_store: OAuthStateStore,
}

impl OAuthService {
    pub fn new(base_url: &str) -> Self {
        let provider = OidcProviderConfig::from_env().and_then(|config| {
            let Some(redirect_uri) = redirect_url(base_url, "/oauth/callback") else {
                tracing::warn!(base_url, "invalid public base url, oauth login disabled");
                return None;
            };
            Some(Arc::new(OidcOAuthProvider::new(
                HTTP_CLIENT.clone(),
                config,
                redirect_uri,
            )) as Arc<dyn OAuthProvider>)
        });

        Self {
            provider,
            state_store: OAuthStateStore::new(OAUTH_STATE_TTL),
        }
    }

    #[cfg(test)]
    pub fn with_provider(provider: Arc<dyn OAuthProvider>) -> Self {
        Self {
            provider: Some(provider),
            state_store: OAuthStateStore::new(OAUTH_STATE_TTL),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<Arc<dyn OAuthProvider>> {
        self.provider.clone()
    }

    pub async fn issue_state(&self, state: OAuthState) -> String {
        self.state_store.insert(state).await
    }

    pub async fn get_state(&self, token: &str) -> Option<OAuthState> {
        self.state_store.get(token).await
    }

    pub async fn invalidate_state(&self, token: &str) {
        self.state_store.invalidate(token).await;
    }
}

fn redirect_url(base_url: &str, path: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let joined = base.join(path).ok()?;
    Some(joined.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_url_resolves_against_the_base() {
        assert_eq!(
            redirect_url("http://127.0.0.1:8082", "/oauth/callback").as_deref(),
            Some("http://127.0.0.1:8082/oauth/callback")
        );
        assert_eq!(
            redirect_url("https://board.example.com/app/", "/oauth/callback").as_deref(),
            Some("https://board.example.com/oauth/callback")
        );
    }

    #[test]
    fn redirect_url_rejects_unparsable_bases() {
        assert!(redirect_url("not a url", "/oauth/callback").is_none());
    }
}
