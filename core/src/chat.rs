use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Database, chat_repo::ChatRepositoryRef},
    ids::{MemberId, UserId, WorkspaceId},
};

pub const DEFAULT_CHAT_HISTORY_LIMIT: i64 = 50;
pub const MAX_CHAT_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct ChatMessageRecord {
    pub id: String,
    pub workspace_id: WorkspaceId,
    pub member_id: MemberId,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct ChatMessageWithAuthor {
    pub id: String,
    pub workspace_id: WorkspaceId,
    pub member_id: MemberId,
    pub body: String,
    pub created_at: i64,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: Option<String>,
}

impl ChatMessageWithAuthor {
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_email)
    }
}

#[derive(Clone)]
pub struct ChatStore {
    chat_repo: ChatRepositoryRef,
}

impl ChatStore {
    pub fn new(database: &Database) -> Self {
        Self {
            chat_repo: database.repositories().chat_repo(),
        }
    }

    pub async fn post(
        &self,
        workspace_id: &str,
        member_id: &str,
        body: &str,
    ) -> Result<ChatMessageRecord> {
        let message = ChatMessageRecord {
            id: Uuid::new_v4().to_string(),
            workspace_id: WorkspaceId::from(workspace_id),
            member_id: MemberId::from(member_id),
            body: body.to_owned(),
            created_at: Utc::now().timestamp(),
        };
        self.chat_repo.insert_message(message.clone()).await?;
        Ok(message)
    }

    /// Most recent messages, oldest first.
    pub async fn list(
        &self,
        workspace_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessageWithAuthor>> {
        let limit = limit
            .unwrap_or(DEFAULT_CHAT_HISTORY_LIMIT)
            .clamp(1, MAX_CHAT_HISTORY_LIMIT);
        self.chat_repo.list_messages(workspace_id, limit).await
    }

    pub async fn find_with_author(&self, id: &str) -> Result<Option<ChatMessageWithAuthor>> {
        self.chat_repo.fetch_message_with_author(id).await
    }
}
