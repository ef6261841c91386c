use serde::{Deserialize, Serialize};

use crate::error::AppError;
use corkboard_core::{
    canvas::{CanvasRecord, IdeaRecord},
    chat::ChatMessageWithAuthor,
    user::UserRecord,
    voice::{VoiceParticipantWithMember, VoiceSessionRecord},
    workspace::WorkspaceRecord,
    workspace_member::{WorkspaceMemberRecord, WorkspaceMemberWithUser},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.into_inner(),
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

impl From<WorkspaceRecord> for WorkspaceResponse {
    fn from(workspace: WorkspaceRecord) -> Self {
        Self {
            id: workspace.id.into_inner(),
            name: workspace.name,
            created_at: workspace.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: i64,
}

impl From<WorkspaceMemberRecord> for MemberResponse {
    fn from(member: WorkspaceMemberRecord) -> Self {
        Self {
            id: member.id.into_inner(),
            workspace_id: member.workspace_id.into_inner(),
            user_id: member.user_id.into_inner(),
            role: member.role.as_str().to_owned(),
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUserResponse {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: i64,
    pub email: String,
    pub name: String,
}

impl From<WorkspaceMemberWithUser> for MemberWithUserResponse {
    fn from(member: WorkspaceMemberWithUser) -> Self {
        let name = member.display_name().to_owned();
        Self {
            id: member.id.into_inner(),
            workspace_id: member.workspace_id.into_inner(),
            user_id: member.user_id.into_inner(),
            role: member.role.as_str().to_owned(),
            joined_at: member.joined_at,
            email: member.user_email,
            name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasResponse {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub created_at: i64,
}

impl From<CanvasRecord> for CanvasResponse {
    fn from(canvas: CanvasRecord) -> Self {
        Self {
            id: canvas.id.into_inner(),
            workspace_id: canvas.workspace_id.into_inner(),
            title: canvas.title,
            created_at: canvas.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaResponse {
    pub id: String,
    pub canvas_id: String,
    pub member_id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<IdeaRecord> for IdeaResponse {
    fn from(idea: IdeaRecord) -> Self {
        Self {
            id: idea.id,
            canvas_id: idea.canvas_id.into_inner(),
            member_id: idea.member_id.into_inner(),
            text: idea.text,
            x: idea.x,
            y: idea.y,
            color: idea.color,
            created_at: idea.created_at,
            updated_at: idea.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: String,
    pub workspace_id: String,
    pub member_id: String,
    pub body: String,
    pub created_at: i64,
    pub author_name: String,
}

impl From<ChatMessageWithAuthor> for ChatMessageResponse {
    fn from(message: ChatMessageWithAuthor) -> Self {
        let author_name = message.display_name().to_owned();
        Self {
            id: message.id,
            workspace_id: message.workspace_id.into_inner(),
            member_id: message.member_id.into_inner(),
            body: message.body,
            created_at: message.created_at,
            author_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSessionResponse {
    pub id: String,
    pub workspace_id: String,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub active: bool,
}

impl From<VoiceSessionRecord> for VoiceSessionResponse {
    fn from(session: VoiceSessionRecord) -> Self {
        let active = !session.is_closed();
        Self {
            id: session.id.into_inner(),
            workspace_id: session.workspace_id.into_inner(),
            started_at: session.started_at,
            ended_at: session.ended_at,
            active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantResponse {
    pub id: String,
    pub session_id: String,
    pub workspace_user_id: String,
    pub workspace_user_name: String,
    pub joined_at: i64,
    pub left_at: Option<i64>,
    pub active: bool,
}

impl From<VoiceParticipantWithMember> for VoiceParticipantResponse {
    fn from(participant: VoiceParticipantWithMember) -> Self {
        let active = participant.is_active();
        let workspace_user_name = participant.display_name().to_owned();
        Self {
            id: participant.id,
            session_id: participant.session_id.into_inner(),
            workspace_user_id: participant.member_id.into_inner(),
            workspace_user_name,
            joined_at: participant.joined_at,
            left_at: participant.left_at,
            active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCanvasRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdeaRequest {
    pub text: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIdeaRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChatMessageRequest {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Body shared by the voice join, leave and move routes. The member is
/// always named explicitly so a facilitator can manage other people.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMemberRequest {
    #[serde(default)]
    pub workspace_user_id: Option<String>,
}

impl VoiceMemberRequest {
    pub fn workspace_user_id(&self) -> Result<&str, AppError> {
        match self.workspace_user_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(AppError::missing_field("workspaceUserId")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveVoiceQuery {
    /// Session being left. Defaults to the session named in the path.
    #[serde(default)]
    pub from_session_id: Option<String>,
    #[serde(default)]
    pub to_session_id: Option<String>,
}
