use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    workspace::WorkspaceRecord,
    workspace_member::{WorkspaceMemberRecord, WorkspaceMemberWithUser},
};

#[derive(Debug, Clone)]
pub struct CreateWorkspaceParams {
    pub workspace: WorkspaceRecord,
    pub owner_membership: WorkspaceMemberRecord,
}

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Inserts the workspace and its owner membership atomically.
    async fn create_workspace(&self, params: CreateWorkspaceParams) -> Result<()>;

    async fn fetch_workspace(&self, id: &str) -> Result<Option<WorkspaceRecord>>;

    async fn delete_workspace(&self, id: &str) -> Result<bool>;

    async fn list_workspaces_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>>;

    async fn insert_member(&self, member: WorkspaceMemberRecord) -> Result<()>;

    async fn fetch_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMemberRecord>>;

    async fn fetch_member_by_id(&self, member_id: &str) -> Result<Option<WorkspaceMemberRecord>>;

    async fn list_members_with_users(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<WorkspaceMemberWithUser>>;

    async fn delete_member(&self, workspace_id: &str, user_id: &str) -> Result<bool>;
}

pub type WorkspaceRepositoryRef = Arc<dyn WorkspaceRepository>;
