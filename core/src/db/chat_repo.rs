use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::chat::{ChatMessageRecord, ChatMessageWithAuthor};

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn insert_message(&self, message: ChatMessageRecord) -> Result<()>;

    /// Most recent `limit` messages for the workspace, oldest first.
    async fn list_messages(
        &self,
        workspace_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessageWithAuthor>>;

    async fn fetch_message_with_author(&self, id: &str)
    -> Result<Option<ChatMessageWithAuthor>>;
}

pub type ChatRepositoryRef = Arc<dyn ChatRepository>;
