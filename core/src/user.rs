use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Database, user_repo::UserRepositoryRef},
    ids::UserId,
};

/// Lifetime of an issued auth session token.
pub const AUTH_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}

impl UserRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone)]
pub struct AuthSessionRecord {
    pub token: String,
    pub user_id: UserId,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct UserStore {
    user_repo: UserRepositoryRef,
}

impl UserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            user_repo: database.repositories().user_repo(),
        }
    }

    pub async fn create(&self, email: &str, name: Option<&str>) -> Result<UserRecord> {
        let record = UserRecord {
            id: UserId::from(Uuid::new_v4().to_string()),
            email: email.trim().to_ascii_lowercase(),
            name: name
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned),
            created_at: Utc::now().timestamp(),
        };
        self.user_repo.create_user(record.clone()).await?;
        Ok(record)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.user_repo.find_user(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.user_repo
            .find_user_by_email(&email.trim().to_ascii_lowercase())
            .await
    }

    /// Resolves an OAuth account to a local user, creating one on first login.
    pub async fn find_or_create_by_email(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<UserRecord> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }
        self.create(email, name).await
    }

    pub async fn create_auth_session(&self, user_id: &str) -> Result<AuthSessionRecord> {
        let now = Utc::now().timestamp();
        let session = AuthSessionRecord {
            token: Uuid::new_v4().to_string(),
            user_id: UserId::from(user_id),
            created_at: now,
            expires_at: now + AUTH_SESSION_TTL_SECONDS,
        };
        self.user_repo.insert_auth_session(session.clone()).await?;
        Ok(session)
    }

    /// Returns the session only while it has not expired.
    pub async fn find_auth_session(&self, token: &str) -> Result<Option<AuthSessionRecord>> {
        self.user_repo
            .find_auth_session(token, Utc::now().timestamp())
            .await
    }

    pub async fn delete_auth_session(&self, token: &str) -> Result<bool> {
        self.user_repo.delete_auth_session(token).await
    }
}
