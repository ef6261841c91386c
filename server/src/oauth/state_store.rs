use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct OAuthState {
    pub redirect_uri: Option<String>,
}

/// Single-use state tokens handed out at login and checked at callback.
#[derive(Clone)]
pub(crate) struct OAuthStateStore {
    cache: Cache<String, OAuthState>,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(1024)
            .build();
        Self { cache }
    }

    pub async fn insert(&self, state: OAuthState) -> String {
        let token = Uuid::new_v4().to_string();
        self.cache.insert(token.clone(), state).await;
        token
    }

    pub async fn get(&self, token: &str) -> Option<OAuthState> {
        self.cache.get(token).await
    }

    pub async fn invalidate(&self, token: &str) {
        self.cache.invalidate(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_round_trips_until_invalidated() {
        let store = OAuthStateStore::new(Duration::from_secs(60));
        let token = store
            .insert(OAuthState {
                redirect_uri: Some("/boards".into()),
            })
            .await;

        let state = store.get(&token).await.expect("state present");
        assert_eq!(state.redirect_uri.as_deref(), Some("/boards"));

        store.invalidate(&token).await;
        assert!(store.get(&token).await.is_none());
    }
}
