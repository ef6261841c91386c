use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        Database,
        canvas_repo::{CanvasRepositoryRef, UpdateIdeaParams},
    },
    ids::{CanvasId, MemberId, WorkspaceId},
};

pub const DEFAULT_IDEA_COLOR: &str = "yellow";

#[derive(Debug, Clone)]
pub struct CanvasRecord {
    pub id: CanvasId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub created_at: i64,
}

/// A sticky note pinned to a canvas.
#[derive(Debug, Clone)]
pub struct IdeaRecord {
    pub id: String,
    pub canvas_id: CanvasId,
    pub member_id: MemberId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct IdeaChanges {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub color: Option<String>,
}

impl IdeaChanges {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.x.is_none() && self.y.is_none() && self.color.is_none()
    }
}

#[derive(Clone)]
pub struct CanvasStore {
    canvas_repo: CanvasRepositoryRef,
}

impl CanvasStore {
    pub fn new(database: &Database) -> Self {
        Self {
            canvas_repo: database.repositories().canvas_repo(),
        }
    }

    pub async fn create_canvas(&self, workspace_id: &str, title: &str) -> Result<CanvasRecord> {
        let canvas = CanvasRecord {
            id: CanvasId::from(Uuid::new_v4().to_string()),
            workspace_id: WorkspaceId::from(workspace_id),
            title: title.trim().to_owned(),
            created_at: Utc::now().timestamp(),
        };
        self.canvas_repo.insert_canvas(canvas.clone()).await?;
        Ok(canvas)
    }

    pub async fn find_canvas(&self, id: &str) -> Result<Option<CanvasRecord>> {
        self.canvas_repo.fetch_canvas(id).await
    }

    pub async fn list_canvases(&self, workspace_id: &str) -> Result<Vec<CanvasRecord>> {
        self.canvas_repo.list_canvases(workspace_id).await
    }

    pub async fn delete_canvas(&self, id: &str) -> Result<bool> {
        self.canvas_repo.delete_canvas(id).await
    }

    pub async fn create_idea(
        &self,
        canvas_id: &str,
        member_id: &str,
        text: &str,
        x: f64,
        y: f64,
        color: Option<&str>,
    ) -> Result<IdeaRecord> {
        let now = Utc::now().timestamp();
        let idea = IdeaRecord {
            id: Uuid::new_v4().to_string(),
            canvas_id: CanvasId::from(canvas_id),
            member_id: MemberId::from(member_id),
            text: text.to_owned(),
            x,
            y,
            color: color
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_IDEA_COLOR)
                .to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.canvas_repo.insert_idea(idea.clone()).await?;
        Ok(idea)
    }

    pub async fn find_idea(&self, id: &str) -> Result<Option<IdeaRecord>> {
        self.canvas_repo.fetch_idea(id).await
    }

    pub async fn list_ideas(&self, canvas_id: &str) -> Result<Vec<IdeaRecord>> {
        self.canvas_repo.list_ideas(canvas_id).await
    }

    pub async fn update_idea(&self, id: &str, changes: IdeaChanges) -> Result<Option<IdeaRecord>> {
        if changes.is_empty() {
            return self.find_idea(id).await;
        }

        let updated = self
            .canvas_repo
            .update_idea(UpdateIdeaParams {
                id: id.to_owned(),
                changes,
                updated_at: Utc::now().timestamp(),
            })
            .await?;

        if !updated {
            return Ok(None);
        }

        self.find_idea(id).await
    }

    pub async fn delete_idea(&self, id: &str) -> Result<bool> {
        self.canvas_repo.delete_idea(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, db::Database, user::UserStore, workspace::WorkspaceStore,
    };

    async fn setup() -> (tempfile::TempDir, CanvasStore, String, String) {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.database_path = temp_dir
            .path()
            .join("canvas.db")
            .to_string_lossy()
            .into_owned();
        let database = Database::connect(&config).await.expect("connect");

        let users = UserStore::new(&database);
        let workspaces = WorkspaceStore::new(&database);
        let user = users
            .create("artist@example.com", None)
            .await
            .expect("create user");
        let (workspace, member) = workspaces
            .create(user.id.as_str(), Some("Canvas Workspace"))
            .await
            .expect("create workspace");

        (
            temp_dir,
            CanvasStore::new(&database),
            workspace.id.into_inner(),
            member.id.into_inner(),
        )
    }

    #[tokio::test]
    async fn ideas_default_to_the_standard_color() {
        let (_dir, store, workspace_id, member_id) = setup().await;
        let canvas = store
            .create_canvas(&workspace_id, "Brainstorm")
            .await
            .expect("create canvas");

        let idea = store
            .create_idea(canvas.id.as_str(), &member_id, "note", 1.0, 2.0, None)
            .await
            .expect("create idea");
        assert_eq!(idea.color, DEFAULT_IDEA_COLOR);

        let tinted = store
            .create_idea(canvas.id.as_str(), &member_id, "note", 0.0, 0.0, Some("  blue "))
            .await
            .expect("create tinted idea");
        assert_eq!(tinted.color, "blue");
    }

    #[tokio::test]
    async fn partial_updates_leave_other_fields_alone() {
        let (_dir, store, workspace_id, member_id) = setup().await;
        let canvas = store
            .create_canvas(&workspace_id, "Brainstorm")
            .await
            .expect("create canvas");
        let idea = store
            .create_idea(canvas.id.as_str(), &member_id, "original", 1.0, 2.0, None)
            .await
            .expect("create idea");

        let updated = store
            .update_idea(
                &idea.id,
                IdeaChanges {
                    x: Some(9.5),
                    ..IdeaChanges::default()
                },
            )
            .await
            .expect("update idea")
            .expect("idea present");

        assert_eq!(updated.x, 9.5);
        assert_eq!(updated.y, 2.0);
        assert_eq!(updated.text, "original");
        assert!(updated.updated_at >= idea.updated_at);
    }

    #[tokio::test]
    async fn empty_updates_are_a_read() {
        let (_dir, store, workspace_id, member_id) = setup().await;
        let canvas = store
            .create_canvas(&workspace_id, "Brainstorm")
            .await
            .expect("create canvas");
        let idea = store
            .create_idea(canvas.id.as_str(), &member_id, "untouched", 0.0, 0.0, None)
            .await
            .expect("create idea");

        let unchanged = store
            .update_idea(&idea.id, IdeaChanges::default())
            .await
            .expect("empty update")
            .expect("idea present");
        assert_eq!(unchanged.updated_at, idea.updated_at);
    }

    #[tokio::test]
    async fn updating_a_missing_idea_returns_none() {
        let (_dir, store, _workspace_id, _member_id) = setup().await;

        let result = store
            .update_idea(
                "missing",
                IdeaChanges {
                    text: Some("ghost".into()),
                    ..IdeaChanges::default()
                },
            )
            .await
            .expect("update call");
        assert!(result.is_none());
    }
}
