use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    chat::{ChatMessageRecord, ChatMessageWithAuthor},
    db::chat_repo::ChatRepository,
    ids::{MemberId, UserId, WorkspaceId},
};

pub struct SqliteChatRepository {
    pool: Pool<Sqlite>,
}

impl SqliteChatRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_message_row(row: SqliteRow) -> ChatMessageWithAuthor {
        ChatMessageWithAuthor {
            id: row.get("id"),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            member_id: MemberId::from(row.get::<String, _>("member_id")),
            body: row.get("body"),
            created_at: row.get("created_at"),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            user_email: row.get("user_email"),
            user_name: row.get("user_name"),
        }
    }
}

const MESSAGE_WITH_AUTHOR_SELECT: &str = "SELECT
     cm.id,
     cm.workspace_id,
     cm.member_id,
     cm.body,
     cm.created_at,
     wm.user_id,
     u.email AS user_email,
     u.name AS user_name
 FROM chat_messages cm
 JOIN workspace_members wm ON wm.id = cm.member_id
 JOIN users u ON u.id = wm.user_id";

#[async_trait]
impl ChatRepository for SqliteChatRepository {
    async fn insert_message(&self, message: ChatMessageRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, workspace_id, member_id, body, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(message.workspace_id.as_str())
        .bind(message.member_id.as_str())
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        workspace_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessageWithAuthor>> {
        // Take the newest rows, then flip them so callers see oldest first.
        let query = format!(
            "SELECT * FROM (
                 {MESSAGE_WITH_AUTHOR_SELECT}
                 WHERE cm.workspace_id = ?
                 ORDER BY cm.created_at DESC, cm.id DESC
                 LIMIT ?
             ) ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(workspace_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Self::map_message_row).collect())
    }

    async fn fetch_message_with_author(
        &self,
        id: &str,
    ) -> Result<Option<ChatMessageWithAuthor>> {
        let query = format!("{MESSAGE_WITH_AUTHOR_SELECT} WHERE cm.id = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Self::map_message_row))
    }
}
