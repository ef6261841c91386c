use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::user::{AuthSessionRecord, UserRecord};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, record: UserRecord) -> Result<()>;

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn insert_auth_session(&self, session: AuthSessionRecord) -> Result<()>;

    /// Returns the session only when `expires_at` is still in the future.
    async fn find_auth_session(&self, token: &str, now: i64)
    -> Result<Option<AuthSessionRecord>>;

    async fn delete_auth_session(&self, token: &str) -> Result<bool>;
}

pub type UserRepositoryRef = Arc<dyn UserRepository>;
