use chrono::Utc;
use corkboard_core::{
    db::errors::is_unique_violation,
    ids::{MemberId, UserId, WorkspaceId},
    workspace::{WorkspaceRecord, WorkspaceStore},
    workspace_member::{WorkspaceMemberRecord, WorkspaceMemberWithUser, WorkspaceRole},
};
use uuid::Uuid;

use crate::error::AppError;

/// Workspace lifecycle and membership rules. Everything here is scoped to a
/// workspace id taken from the request path; memberships from other
/// workspaces are invisible.
#[derive(Clone)]
pub struct WorkspaceService {
    workspaces: WorkspaceStore,
}

impl WorkspaceService {
    pub fn new(workspaces: WorkspaceStore) -> Self {
        Self { workspaces }
    }

    pub async fn create(
        &self,
        creator_user_id: &str,
        name: Option<&str>,
    ) -> Result<(WorkspaceRecord, WorkspaceMemberRecord), AppError> {
        self.workspaces
            .create(creator_user_id, name)
            .await
            .map_err(AppError::from_anyhow)
    }

    pub async fn fetch_workspace(&self, workspace_id: &str) -> Result<WorkspaceRecord, AppError> {
        self.workspaces
            .find_by_id(workspace_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::workspace_not_found(workspace_id))
    }

    /// The caller must hold a membership in the workspace. Also confirms the
    /// workspace itself exists so a missing workspace reads as 404, not 403.
    pub async fn require_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMemberRecord, AppError> {
        self.fetch_workspace(workspace_id).await?;

        self.workspaces
            .find_member(workspace_id, user_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::not_a_member(workspace_id))
    }

    pub async fn require_owner(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMemberRecord, AppError> {
        let member = self.require_member(workspace_id, user_id).await?;
        if member.role != WorkspaceRole::Owner {
            return Err(AppError::insufficient_role(workspace_id));
        }
        Ok(member)
    }

    pub async fn join(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMemberRecord, AppError> {
        self.fetch_workspace(workspace_id).await?;

        let existing = self
            .workspaces
            .find_member(workspace_id, user_id)
            .await
            .map_err(AppError::from_anyhow)?;
        if existing.is_some() {
            return Err(AppError::already_joined_workspace(workspace_id));
        }

        let member = WorkspaceMemberRecord {
            id: MemberId::from(Uuid::new_v4().to_string()),
            workspace_id: WorkspaceId::from(workspace_id),
            user_id: UserId::from(user_id),
            role: WorkspaceRole::Member,
            joined_at: Utc::now().timestamp(),
        };

        match self.workspaces.insert_member(member.clone()).await {
            Ok(()) => Ok(member),
            // Lost a race with a concurrent join by the same user.
            Err(error) if is_unique_violation(&error) => {
                Err(AppError::already_joined_workspace(workspace_id))
            }
            Err(error) => Err(AppError::from_anyhow(error)),
        }
    }

    /// Owner-only. The workspace owner's own membership cannot be removed;
    /// delete the workspace instead.
    pub async fn remove_member(
        &self,
        workspace_id: &str,
        caller_user_id: &str,
        target_user_id: &str,
    ) -> Result<WorkspaceMemberRecord, AppError> {
        self.require_owner(workspace_id, caller_user_id).await?;

        let target = self
            .workspaces
            .find_member(workspace_id, target_user_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::membership_not_found(workspace_id, target_user_id))?;

        if target.role == WorkspaceRole::Owner {
            return Err(AppError::bad_request("the workspace owner cannot be removed")
                .with_name("CANNOT_REMOVE_OWNER"));
        }

        self.workspaces
            .remove_member(workspace_id, target.user_id.as_str())
            .await
            .map_err(AppError::from_anyhow)?;

        Ok(target)
    }

    pub async fn delete(&self, workspace_id: &str, caller_user_id: &str) -> Result<(), AppError> {
        self.require_owner(workspace_id, caller_user_id).await?;
        self.workspaces
            .delete(workspace_id)
            .await
            .map_err(AppError::from_anyhow)?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>, AppError> {
        self.workspaces
            .list_for_user(user_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    pub async fn list_members(
        &self,
        workspace_id: &str,
        caller_user_id: &str,
    ) -> Result<Vec<WorkspaceMemberWithUser>, AppError> {
        self.require_member(workspace_id, caller_user_id).await?;
        self.workspaces
            .list_members_with_users(workspace_id)
            .await
            .map_err(AppError::from_anyhow)
    }

}

#[cfg(test)]
mod tests {
    use crate::test_support::{seed_member, seed_user, seed_workspace, setup_state};

    #[tokio::test]
    async fn create_grants_the_creator_an_owner_membership() {
        let (_dir, _db, state) = setup_state().await;
        let (user, workspace, owner) = seed_workspace(&state).await;

        assert_eq!(owner.workspace_id.as_str(), workspace.id.as_str());
        assert_eq!(owner.user_id.as_str(), user.id.as_str());
        assert_eq!(owner.role.as_str(), "owner");

        let members = state
            .workspace_service
            .list_members(workspace.id.as_str(), user.id.as_str())
            .await
            .expect("list members");
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn joining_twice_is_a_conflict() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;
        let joiner = seed_user(&state, "joiner@example.com").await;

        state
            .workspace_service
            .join(workspace.id.as_str(), joiner.id.as_str())
            .await
            .expect("first join");
        let err = state
            .workspace_service
            .join(workspace.id.as_str(), joiner.id.as_str())
            .await
            .expect_err("second join");
        assert_eq!(err.kind(), "ALREADY_JOINED_WORKSPACE");
    }

    #[tokio::test]
    async fn non_members_are_rejected() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;
        let outsider = seed_user(&state, "outsider@example.com").await;

        let err = state
            .workspace_service
            .require_member(workspace.id.as_str(), outsider.id.as_str())
            .await
            .expect_err("outsider rejected");
        assert_eq!(err.kind(), "NOT_A_MEMBER");
    }

    #[tokio::test]
    async fn unknown_workspaces_read_as_not_found() {
        let (_dir, _db, state) = setup_state().await;
        let user = seed_user(&state, "solo@example.com").await;

        let err = state
            .workspace_service
            .require_member("missing-workspace", user.id.as_str())
            .await
            .expect_err("workspace missing");
        assert_eq!(err.kind(), "WORKSPACE_NOT_FOUND");
    }

    #[tokio::test]
    async fn only_owners_may_remove_members() {
        let (_dir, _db, state) = setup_state().await;
        let (owner_user, workspace, _owner) = seed_workspace(&state).await;
        let (member_user, _member) =
            seed_member(&state, workspace.id.as_str(), "member@example.com").await;

        let err = state
            .workspace_service
            .remove_member(
                workspace.id.as_str(),
                member_user.id.as_str(),
                owner_user.id.as_str(),
            )
            .await
            .expect_err("member cannot remove");
        assert_eq!(err.kind(), "INSUFFICIENT_ROLE");

        let removed = state
            .workspace_service
            .remove_member(
                workspace.id.as_str(),
                owner_user.id.as_str(),
                member_user.id.as_str(),
            )
            .await
            .expect("owner removes member");
        assert_eq!(removed.user_id.as_str(), member_user.id.as_str());
    }

    #[tokio::test]
    async fn the_owner_membership_cannot_be_removed() {
        let (_dir, _db, state) = setup_state().await;
        let (owner_user, workspace, _owner) = seed_workspace(&state).await;

        let err = state
            .workspace_service
            .remove_member(
                workspace.id.as_str(),
                owner_user.id.as_str(),
                owner_user.id.as_str(),
            )
            .await
            .expect_err("owner removal rejected");
        assert_eq!(err.kind(), "CANNOT_REMOVE_OWNER");
    }

    #[tokio::test]
    async fn removing_an_unknown_member_is_not_found() {
        let (_dir, _db, state) = setup_state().await;
        let (owner_user, workspace, _owner) = seed_workspace(&state).await;

        let err = state
            .workspace_service
            .remove_member(workspace.id.as_str(), owner_user.id.as_str(), "nobody")
            .await
            .expect_err("unknown member");
        assert_eq!(err.kind(), "MEMBERSHIP_NOT_FOUND");
    }

    #[tokio::test]
    async fn deleting_a_workspace_hides_it_from_listings() {
        let (_dir, _db, state) = setup_state().await;
        let (owner_user, workspace, _owner) = seed_workspace(&state).await;

        state
            .workspace_service
            .delete(workspace.id.as_str(), owner_user.id.as_str())
            .await
            .expect("delete workspace");

        let listed = state
            .workspace_service
            .list_for_user(owner_user.id.as_str())
            .await
            .expect("list workspaces");
        assert!(listed.is_empty());
    }
}
