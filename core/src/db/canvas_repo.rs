use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::canvas::{CanvasRecord, IdeaChanges, IdeaRecord};

#[derive(Debug, Clone)]
pub struct UpdateIdeaParams {
    pub id: String,
    pub changes: IdeaChanges,
    pub updated_at: i64,
}

#[async_trait]
pub trait CanvasRepository: Send + Sync {
    async fn insert_canvas(&self, canvas: CanvasRecord) -> Result<()>;

    async fn fetch_canvas(&self, id: &str) -> Result<Option<CanvasRecord>>;

    async fn list_canvases(&self, workspace_id: &str) -> Result<Vec<CanvasRecord>>;

    async fn delete_canvas(&self, id: &str) -> Result<bool>;

    async fn insert_idea(&self, idea: IdeaRecord) -> Result<()>;

    async fn fetch_idea(&self, id: &str) -> Result<Option<IdeaRecord>>;

    async fn list_ideas(&self, canvas_id: &str) -> Result<Vec<IdeaRecord>>;

    async fn update_idea(&self, params: UpdateIdeaParams) -> Result<bool>;

    async fn delete_idea(&self, id: &str) -> Result<bool>;
}

pub type CanvasRepositoryRef = Arc<dyn CanvasRepository>;
