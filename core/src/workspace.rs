use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        Database,
        workspace_repo::{CreateWorkspaceParams, WorkspaceRepositoryRef},
    },
    ids::{UserId, WorkspaceId},
    workspace_member::{WorkspaceMemberRecord, WorkspaceMemberWithUser, WorkspaceRole},
};

pub const DEFAULT_WORKSPACE_NAME: &str = "Untitled Workspace";

#[derive(Debug, Clone)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct WorkspaceStore {
    workspace_repo: WorkspaceRepositoryRef,
}

impl WorkspaceStore {
    pub fn new(database: &Database) -> Self {
        Self {
            workspace_repo: database.repositories().workspace_repo(),
        }
    }

    /// Creates the workspace together with an OWNER membership for the
    /// creator in one transaction.
    pub async fn create(
        &self,
        creator_user_id: &str,
        name: Option<&str>,
    ) -> Result<(WorkspaceRecord, WorkspaceMemberRecord)> {
        let created_at = Utc::now().timestamp();
        let resolved_name = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| DEFAULT_WORKSPACE_NAME.to_string());

        let workspace = WorkspaceRecord {
            id: WorkspaceId::from(Uuid::new_v4().to_string()),
            name: resolved_name,
            created_at,
        };
        let owner_membership = WorkspaceMemberRecord {
            id: crate::ids::MemberId::from(Uuid::new_v4().to_string()),
            workspace_id: workspace.id.clone(),
            user_id: UserId::from(creator_user_id),
            role: WorkspaceRole::Owner,
            joined_at: created_at,
        };

        self.workspace_repo
            .create_workspace(CreateWorkspaceParams {
                workspace: workspace.clone(),
                owner_membership: owner_membership.clone(),
            })
            .await?;

        Ok((workspace, owner_membership))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        self.workspace_repo.fetch_workspace(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.workspace_repo.delete_workspace(id).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>> {
        self.workspace_repo.list_workspaces_for_user(user_id).await
    }

    pub async fn insert_member(&self, member: WorkspaceMemberRecord) -> Result<()> {
        self.workspace_repo.insert_member(member).await
    }

    pub async fn find_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMemberRecord>> {
        self.workspace_repo.fetch_member(workspace_id, user_id).await
    }

    pub async fn find_member_by_id(
        &self,
        member_id: &str,
    ) -> Result<Option<WorkspaceMemberRecord>> {
        self.workspace_repo.fetch_member_by_id(member_id).await
    }

    pub async fn list_members_with_users(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<WorkspaceMemberWithUser>> {
        self.workspace_repo.list_members_with_users(workspace_id).await
    }

    pub async fn remove_member(&self, workspace_id: &str, user_id: &str) -> Result<bool> {
        self.workspace_repo.delete_member(workspace_id, user_id).await
    }
}
