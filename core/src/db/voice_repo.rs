use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::voice::{VoiceParticipantRecord, VoiceParticipantWithMember, VoiceSessionRecord};

#[async_trait]
pub trait VoiceRepository: Send + Sync {
    async fn insert_session(&self, session: VoiceSessionRecord) -> Result<()>;

    async fn fetch_session(&self, id: &str) -> Result<Option<VoiceSessionRecord>>;

    /// Stamps `ended_at` on an open session. Returns false when the session
    /// was already closed (the original timestamp is preserved).
    async fn close_session(&self, id: &str, ended_at: i64) -> Result<bool>;

    async fn list_sessions(&self, workspace_id: &str) -> Result<Vec<VoiceSessionRecord>>;

    /// Inserts an active stay. The partial unique index on
    /// (session_id, member_id) WHERE left_at IS NULL rejects a second active
    /// row for the same pair; callers map that violation to the
    /// already-joined error.
    async fn insert_participant(&self, participant: VoiceParticipantRecord) -> Result<()>;

    async fn fetch_active_participant(
        &self,
        session_id: &str,
        member_id: &str,
    ) -> Result<Option<VoiceParticipantRecord>>;

    /// Sets `left_at` on a still-active row. Returns false when the row does
    /// not exist or has already departed.
    async fn mark_departed(&self, participant_id: &str, left_at: i64) -> Result<bool>;

    async fn fetch_participant_with_member(
        &self,
        participant_id: &str,
    ) -> Result<Option<VoiceParticipantWithMember>>;

    async fn list_participants(
        &self,
        session_id: &str,
        active_only: bool,
    ) -> Result<Vec<VoiceParticipantWithMember>>;

    async fn count_active(&self, session_id: &str) -> Result<i64>;
}

pub type VoiceRepositoryRef = Arc<dyn VoiceRepository>;
