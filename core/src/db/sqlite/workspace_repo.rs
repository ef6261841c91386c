use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::workspace_repo::{CreateWorkspaceParams, WorkspaceRepository},
    ids::{MemberId, UserId, WorkspaceId},
    workspace::WorkspaceRecord,
    workspace_member::{WorkspaceMemberRecord, WorkspaceMemberWithUser, WorkspaceRole},
};

pub struct SqliteWorkspaceRepository {
    pool: Pool<Sqlite>,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_workspace_row(row: SqliteRow) -> WorkspaceRecord {
        WorkspaceRecord {
            id: WorkspaceId::from(row.get::<String, _>("id")),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }
    }

    fn map_member_row(row: SqliteRow) -> WorkspaceMemberRecord {
        WorkspaceMemberRecord {
            id: MemberId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            role: WorkspaceRole::parse(row.get::<String, _>("role").as_str()),
            joined_at: row.get("joined_at"),
        }
    }

    fn map_member_with_user_row(row: SqliteRow) -> WorkspaceMemberWithUser {
        WorkspaceMemberWithUser {
            id: MemberId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            role: WorkspaceRole::parse(row.get::<String, _>("role").as_str()),
            joined_at: row.get("joined_at"),
            user_email: row.get("user_email"),
            user_name: row.get("user_name"),
        }
    }
}

#[async_trait]
impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn create_workspace(&self, params: CreateWorkspaceParams) -> Result<()> {
        let CreateWorkspaceParams {
            workspace,
            owner_membership,
        } = params;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO workspaces (id, name, created_at) VALUES (?, ?, ?)")
            .bind(workspace.id.as_str())
            .bind(&workspace.name)
            .bind(workspace.created_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(owner_membership.id.as_str())
        .bind(owner_membership.workspace_id.as_str())
        .bind(owner_membership.user_id.as_str())
        .bind(owner_membership.role.as_str())
        .bind(owner_membership.joined_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_workspace(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        let row = sqlx::query("SELECT id, name, created_at FROM workspaces WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Self::map_workspace_row))
    }

    async fn delete_workspace(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_workspaces_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>> {
        let rows = sqlx::query(
            "SELECT w.id, w.name, w.created_at
             FROM workspaces w
             JOIN workspace_members wm ON wm.workspace_id = w.id
             WHERE wm.user_id = ?
             ORDER BY w.created_at ASC, w.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Self::map_workspace_row).collect())
    }

    async fn insert_member(&self, member: WorkspaceMemberRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(member.id.as_str())
        .bind(member.workspace_id.as_str())
        .bind(member.user_id.as_str())
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMemberRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, user_id, role, joined_at
             FROM workspace_members
             WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_member_row))
    }

    async fn fetch_member_by_id(&self, member_id: &str) -> Result<Option<WorkspaceMemberRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, user_id, role, joined_at
             FROM workspace_members
             WHERE id = ?",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_member_row))
    }

    async fn list_members_with_users(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<WorkspaceMemberWithUser>> {
        let rows = sqlx::query(
            "SELECT
                 wm.id,
                 wm.workspace_id,
                 wm.user_id,
                 wm.role,
                 wm.joined_at,
                 u.email AS user_email,
                 u.name AS user_name
             FROM workspace_members wm
             JOIN users u ON u.id = wm.user_id
             WHERE wm.workspace_id = ?
             ORDER BY wm.joined_at ASC, wm.id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(Self::map_member_with_user_row)
            .collect())
    }

    async fn delete_member(&self, workspace_id: &str, user_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?")
                .bind(workspace_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
