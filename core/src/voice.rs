use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Database, voice_repo::VoiceRepositoryRef},
    ids::{MemberId, UserId, VoiceSessionId, WorkspaceId},
};

#[derive(Debug, Clone)]
pub struct VoiceSessionRecord {
    pub id: VoiceSessionId,
    pub workspace_id: WorkspaceId,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

impl VoiceSessionRecord {
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// One stay of a member in a voice session. A row is created per join and
/// marked departed on leave; rows are never reused or deleted.
#[derive(Debug, Clone)]
pub struct VoiceParticipantRecord {
    pub id: String,
    pub session_id: VoiceSessionId,
    pub member_id: MemberId,
    pub joined_at: i64,
    pub left_at: Option<i64>,
}

impl VoiceParticipantRecord {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct VoiceParticipantWithMember {
    pub id: String,
    pub session_id: VoiceSessionId,
    pub member_id: MemberId,
    pub joined_at: i64,
    pub left_at: Option<i64>,
    pub member_workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: Option<String>,
}

impl VoiceParticipantWithMember {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_email)
    }
}

#[derive(Clone)]
pub struct VoiceStore {
    voice_repo: VoiceRepositoryRef,
}

impl VoiceStore {
    pub fn new(database: &Database) -> Self {
        Self {
            voice_repo: database.repositories().voice_repo(),
        }
    }

    pub async fn create_session(&self, workspace_id: &str) -> Result<VoiceSessionRecord> {
        let session = VoiceSessionRecord {
            id: VoiceSessionId::from(Uuid::new_v4().to_string()),
            workspace_id: WorkspaceId::from(workspace_id),
            started_at: Utc::now().timestamp(),
            ended_at: None,
        };
        self.voice_repo.insert_session(session.clone()).await?;
        Ok(session)
    }

    pub async fn find_session(&self, id: &str) -> Result<Option<VoiceSessionRecord>> {
        self.voice_repo.fetch_session(id).await
    }

    /// Stamps `ended_at` once. Closing an already-closed session leaves the
    /// original timestamp in place.
    pub async fn close_session(&self, id: &str) -> Result<bool> {
        self.voice_repo
            .close_session(id, Utc::now().timestamp())
            .await
    }

    pub async fn list_sessions(&self, workspace_id: &str) -> Result<Vec<VoiceSessionRecord>> {
        self.voice_repo.list_sessions(workspace_id).await
    }

    pub async fn insert_participant(
        &self,
        session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantRecord> {
        let participant = VoiceParticipantRecord {
            id: Uuid::new_v4().to_string(),
            session_id: VoiceSessionId::from(session_id),
            member_id: MemberId::from(member_id),
            joined_at: Utc::now().timestamp(),
            left_at: None,
        };
        self.voice_repo
            .insert_participant(participant.clone())
            .await?;
        Ok(participant)
    }

    pub async fn find_active_participant(
        &self,
        session_id: &str,
        member_id: &str,
    ) -> Result<Option<VoiceParticipantRecord>> {
        self.voice_repo
            .fetch_active_participant(session_id, member_id)
            .await
    }

    /// One-way departure: only rows that are still active are stamped.
    pub async fn mark_departed(&self, participant_id: &str) -> Result<bool> {
        self.voice_repo
            .mark_departed(participant_id, Utc::now().timestamp())
            .await
    }

    pub async fn find_participant_with_member(
        &self,
        participant_id: &str,
    ) -> Result<Option<VoiceParticipantWithMember>> {
        self.voice_repo
            .fetch_participant_with_member(participant_id)
            .await
    }

    pub async fn list_active_participants(
        &self,
        session_id: &str,
    ) -> Result<Vec<VoiceParticipantWithMember>> {
        self.voice_repo.list_participants(session_id, true).await
    }

    pub async fn list_all_participants(
        &self,
        session_id: &str,
    ) -> Result<Vec<VoiceParticipantWithMember>> {
        self.voice_repo.list_participants(session_id, false).await
    }

    pub async fn count_active_participants(&self, session_id: &str) -> Result<i64> {
        self.voice_repo.count_active(session_id).await
    }
}
