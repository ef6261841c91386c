use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    canvas::{CanvasRecord, IdeaRecord},
    db::canvas_repo::{CanvasRepository, UpdateIdeaParams},
    ids::{CanvasId, MemberId, WorkspaceId},
};

pub struct SqliteCanvasRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCanvasRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_canvas_row(row: SqliteRow) -> CanvasRecord {
        CanvasRecord {
            id: CanvasId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            title: row.get("title"),
            created_at: row.get("created_at"),
        }
    }

    fn map_idea_row(row: SqliteRow) -> IdeaRecord {
        IdeaRecord {
            id: row.get("id"),
            canvas_id: CanvasId::from(row.get::<String, _>("canvas_id")),
            member_id: MemberId::from(row.get::<String, _>("member_id")),
            text: row.get("text"),
            x: row.get("x"),
            y: row.get("y"),
            color: row.get("color"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl CanvasRepository for SqliteCanvasRepository {
    async fn insert_canvas(&self, canvas: CanvasRecord) -> Result<()> {
        sqlx::query("INSERT INTO canvases (id, workspace_id, title, created_at) VALUES (?, ?, ?, ?)")
            .bind(canvas.id.as_str())
            .bind(canvas.workspace_id.as_str())
            .bind(&canvas.title)
            .bind(canvas.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_canvas(&self, id: &str) -> Result<Option<CanvasRecord>> {
        let row =
            sqlx::query("SELECT id, workspace_id, title, created_at FROM canvases WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Self::map_canvas_row))
    }

    async fn list_canvases(&self, workspace_id: &str) -> Result<Vec<CanvasRecord>> {
        let rows = sqlx::query(
            "SELECT id, workspace_id, title, created_at
             FROM canvases
             WHERE workspace_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Self::map_canvas_row).collect())
    }

    async fn delete_canvas(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM canvases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_idea(&self, idea: IdeaRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO ideas (id, canvas_id, member_id, text, x, y, color, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&idea.id)
        .bind(idea.canvas_id.as_str())
        .bind(idea.member_id.as_str())
        .bind(&idea.text)
        .bind(idea.x)
        .bind(idea.y)
        .bind(&idea.color)
        .bind(idea.created_at)
        .bind(idea.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_idea(&self, id: &str) -> Result<Option<IdeaRecord>> {
        let row = sqlx::query(
            "SELECT id, canvas_id, member_id, text, x, y, color, created_at, updated_at
             FROM ideas
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_idea_row))
    }

    async fn list_ideas(&self, canvas_id: &str) -> Result<Vec<IdeaRecord>> {
        let rows = sqlx::query(
            "SELECT id, canvas_id, member_id, text, x, y, color, created_at, updated_at
             FROM ideas
             WHERE canvas_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(canvas_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Self::map_idea_row).collect())
    }

    async fn update_idea(&self, params: UpdateIdeaParams) -> Result<bool> {
        let UpdateIdeaParams {
            id,
            changes,
            updated_at,
        } = params;

        let mut builder = QueryBuilder::new("UPDATE ideas SET ");
        let mut has_updates = false;

        if let Some(text) = changes.text {
            builder.push("text = ");
            builder.push_bind(text);
            has_updates = true;
        }
        if let Some(x) = changes.x {
            if has_updates {
                builder.push(", ");
            }
            builder.push("x = ");
            builder.push_bind(x);
            has_updates = true;
        }
        if let Some(y) = changes.y {
            if has_updates {
                builder.push(", ");
            }
            builder.push("y = ");
            builder.push_bind(y);
            has_updates = true;
        }
        if let Some(color) = changes.color {
            if has_updates {
                builder.push(", ");
            }
            builder.push("color = ");
            builder.push_bind(color);
            has_updates = true;
        }

        if !has_updates {
            return Ok(false);
        }

        builder.push(", updated_at = ");
        builder.push_bind(updated_at);
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_idea(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ideas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
