use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::user_repo::UserRepository,
    ids::UserId,
    user::{AuthSessionRecord, UserRecord},
};

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_user_row(row: SqliteRow) -> UserRecord {
        UserRecord {
            id: UserId::from(row.get::<String, _>("id")),
            email: row.get("email"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }
    }

    fn map_session_row(row: SqliteRow) -> AuthSessionRecord {
        AuthSessionRecord {
            token: row.get("token"),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, record: UserRecord) -> Result<()> {
        sqlx::query("INSERT INTO users (id, email, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(record.id.as_str())
            .bind(&record.email)
            .bind(record.name.as_ref())
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Self::map_user_row))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Self::map_user_row))
    }

    async fn insert_auth_session(&self, session: AuthSessionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.user_id.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_auth_session(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Option<AuthSessionRecord>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at
             FROM auth_sessions
             WHERE token = ? AND expires_at > ?",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_session_row))
    }

    async fn delete_auth_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
