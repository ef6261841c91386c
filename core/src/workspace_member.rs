use serde::{Deserialize, Serialize};

use crate::ids::{MemberId, UserId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Member,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Owner => "owner",
            WorkspaceRole::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("owner") {
            WorkspaceRole::Owner
        } else {
            WorkspaceRole::Member
        }
    }
}

impl std::fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceMemberRecord {
    pub id: MemberId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: WorkspaceRole,
    pub joined_at: i64,
}

#[derive(Debug, Clone)]
pub struct WorkspaceMemberWithUser {
    pub id: MemberId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: WorkspaceRole,
    pub joined_at: i64,
    pub user_email: String,
    pub user_name: Option<String>,
}

impl WorkspaceMemberWithUser {
    /// Display name shown in member lists and voice participant payloads.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(WorkspaceRole::parse("owner"), WorkspaceRole::Owner);
        assert_eq!(WorkspaceRole::parse("OWNER"), WorkspaceRole::Owner);
        assert_eq!(WorkspaceRole::parse("member"), WorkspaceRole::Member);
        assert_eq!(WorkspaceRole::Owner.as_str(), "owner");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let member = WorkspaceMemberWithUser {
            id: MemberId::from("m1"),
            workspace_id: WorkspaceId::from("w1"),
            user_id: UserId::from("u1"),
            role: WorkspaceRole::Member,
            joined_at: 0,
            user_email: "user@example.com".into(),
            user_name: None,
        };
        assert_eq!(member.display_name(), "user@example.com");
    }
}
