use corkboard_core::{
    db::errors::is_unique_violation,
    voice::{VoiceParticipantWithMember, VoiceSessionRecord, VoiceStore},
    workspace::WorkspaceStore,
};
use serde_json::json;

use crate::{
    error::AppError,
    realtime::{
        EVENT_USER_JOINED, EVENT_USER_LEFT, EVENT_USER_MOVED, NotificationSinkRef, voice_topic,
    },
    types::VoiceParticipantResponse,
};

/// Voice session membership. Join, leave and move all operate on an
/// explicitly named workspace membership, so a facilitator can manage other
/// participants, and every mutation is validated against the workspace id
/// in the request path before anything is written.
#[derive(Clone)]
pub struct VoiceService {
    voice: VoiceStore,
    workspaces: WorkspaceStore,
    sink: NotificationSinkRef,
}

impl VoiceService {
    pub fn new(voice: VoiceStore, workspaces: WorkspaceStore, sink: NotificationSinkRef) -> Self {
        Self {
            voice,
            workspaces,
            sink,
        }
    }

    pub async fn start_session(&self, workspace_id: &str) -> Result<VoiceSessionRecord, AppError> {
        self.voice
            .create_session(workspace_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    /// Ending an already-ended session is a no-op that returns the session
    /// with its original `ended_at` untouched.
    pub async fn end_session(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<VoiceSessionRecord, AppError> {
        let session = self.fetch_session(workspace_id, session_id).await?;
        if session.is_closed() {
            return Ok(session);
        }

        self.voice
            .close_session(session_id)
            .await
            .map_err(AppError::from_anyhow)?;

        self.fetch_session(workspace_id, session_id).await
    }

    pub async fn list_sessions(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<VoiceSessionRecord>, AppError> {
        self.voice
            .list_sessions(workspace_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    pub async fn fetch_session(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<VoiceSessionRecord, AppError> {
        let session = self
            .voice
            .find_session(session_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::session_not_found(session_id))?;

        if session.workspace_id.as_str() != workspace_id {
            return Err(AppError::session_not_in_workspace(session_id, workspace_id));
        }

        Ok(session)
    }

    pub async fn join(
        &self,
        workspace_id: &str,
        session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantWithMember, AppError> {
        let participant = self.join_inner(workspace_id, session_id, member_id).await?;

        self.sink.broadcast(
            &voice_topic(session_id),
            EVENT_USER_JOINED,
            participant_payload(&participant),
        );

        Ok(participant)
    }

    pub async fn leave(
        &self,
        workspace_id: &str,
        session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantWithMember, AppError> {
        let participant = self.leave_inner(workspace_id, session_id, member_id).await?;

        self.sink.broadcast(
            &voice_topic(session_id),
            EVENT_USER_LEFT,
            participant_payload(&participant),
        );

        Ok(participant)
    }

    /// Departure from the source is best effort: a member who was never
    /// active there still moves. Every other failure, including a
    /// cross-workspace source session, aborts the move before the join.
    pub async fn move_member(
        &self,
        workspace_id: &str,
        from_session_id: &str,
        to_session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantWithMember, AppError> {
        let departed = match self
            .leave_inner(workspace_id, from_session_id, member_id)
            .await
        {
            Ok(participant) => Some(participant),
            Err(error) if error.kind() == "ACTIVE_PARTICIPANT_NOT_FOUND" => None,
            Err(error) => return Err(error),
        };

        let joined = self
            .join_inner(workspace_id, to_session_id, member_id)
            .await?;

        let payload = json!({
            "fromSessionId": from_session_id,
            "toSessionId": to_session_id,
            "participant": participant_payload(&joined),
        });
        if departed.is_some() {
            self.sink
                .broadcast(&voice_topic(from_session_id), EVENT_USER_MOVED, payload.clone());
        }
        self.sink
            .broadcast(&voice_topic(to_session_id), EVENT_USER_MOVED, payload);

        Ok(joined)
    }

    pub async fn list_active_participants(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<Vec<VoiceParticipantWithMember>, AppError> {
        self.fetch_session(workspace_id, session_id).await?;
        self.voice
            .list_active_participants(session_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    pub async fn list_all_participants(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<Vec<VoiceParticipantWithMember>, AppError> {
        self.fetch_session(workspace_id, session_id).await?;
        self.voice
            .list_all_participants(session_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    pub async fn count_active_participants(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<i64, AppError> {
        self.fetch_session(workspace_id, session_id).await?;
        self.voice
            .count_active_participants(session_id)
            .await
            .map_err(AppError::from_anyhow)
    }

    // Validation order is load bearing: membership before session, existence
    // before scoping, scoping before liveness, liveness before duplicates.
    async fn join_inner(
        &self,
        workspace_id: &str,
        session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantWithMember, AppError> {
        let membership = self
            .workspaces
            .find_member_by_id(member_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::membership_not_found(workspace_id, member_id))?;

        if membership.workspace_id.as_str() != workspace_id {
            return Err(AppError::workspace_mismatch(workspace_id, member_id));
        }

        let session = self
            .voice
            .find_session(session_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::session_not_found(session_id))?;

        if session.workspace_id.as_str() != workspace_id {
            return Err(AppError::session_not_in_workspace(session_id, workspace_id));
        }

        if session.is_closed() {
            return Err(AppError::session_closed(session_id));
        }

        let already_active = self
            .voice
            .find_active_participant(session_id, member_id)
            .await
            .map_err(AppError::from_anyhow)?;
        if already_active.is_some() {
            return Err(AppError::already_joined(session_id, member_id));
        }

        let inserted = match self.voice.insert_participant(session_id, member_id).await {
            Ok(participant) => participant,
            // The partial unique index on (session_id, member_id) where
            // left_at is null turns a concurrent duplicate join into a
            // constraint violation; only one caller wins.
            Err(error) if is_unique_violation(&error) => {
                return Err(AppError::already_joined(session_id, member_id));
            }
            Err(error) => return Err(AppError::from_anyhow(error)),
        };

        self.voice
            .find_participant_with_member(&inserted.id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| {
                AppError::internal(anyhow::anyhow!(
                    "participant {} vanished after insert",
                    inserted.id
                ))
            })
    }

    async fn leave_inner(
        &self,
        workspace_id: &str,
        session_id: &str,
        member_id: &str,
    ) -> Result<VoiceParticipantWithMember, AppError> {
        let active = self
            .voice
            .find_active_participant(session_id, member_id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| AppError::active_participant_not_found(session_id, member_id))?;

        let membership = self
            .workspaces
            .find_member_by_id(member_id)
            .await
            .map_err(AppError::from_anyhow)?;
        let in_workspace = membership
            .map(|record| record.workspace_id.as_str() == workspace_id)
            .unwrap_or(false);
        if !in_workspace {
            return Err(AppError::workspace_mismatch(workspace_id, member_id));
        }

        let departed = self
            .voice
            .mark_departed(&active.id)
            .await
            .map_err(AppError::from_anyhow)?;
        if !departed {
            // Raced with another leave; the row is already stamped.
            return Err(AppError::active_participant_not_found(session_id, member_id));
        }

        self.voice
            .find_participant_with_member(&active.id)
            .await
            .map_err(AppError::from_anyhow)?
            .ok_or_else(|| {
                AppError::internal(anyhow::anyhow!(
                    "participant {} vanished after departure",
                    active.id
                ))
            })
    }
}

fn participant_payload(participant: &VoiceParticipantWithMember) -> serde_json::Value {
    let response = VoiceParticipantResponse::from(participant.clone());
    serde_json::to_value(&response).unwrap_or_else(|_| json!(null))
}

#[cfg(test)]
mod tests {
    use crate::realtime::{EVENT_USER_JOINED, voice_topic};
    use crate::test_support::{seed_member, seed_session, seed_user, seed_workspace, setup_state};

    #[tokio::test]
    async fn join_creates_an_active_participant() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let participant = state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("join session");

        assert_eq!(participant.session_id.as_str(), session.id.as_str());
        assert_eq!(participant.member_id.as_str(), owner.id.as_str());
        assert!(participant.is_active());

        let active = state
            .voice_service
            .list_active_participants(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("list active");
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn join_broadcasts_on_the_session_topic() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;
        let mut rx = state.notifications.subscribe(&voice_topic(session.id.as_str()));

        state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("join session");

        let event = rx.recv().await.expect("event delivered");
        assert_eq!(event.event, EVENT_USER_JOINED);
        assert_eq!(event.payload["workspaceUserId"], owner.id.as_str());
        assert_eq!(event.payload["active"], true);
    }

    #[tokio::test]
    async fn leave_is_one_way_and_cannot_repeat() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("join session");

        let departed = state
            .voice_service
            .leave(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("leave session");
        assert!(departed.left_at.is_some());
        assert!(!departed.is_active());

        let err = state
            .voice_service
            .leave(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect_err("second leave fails");
        assert_eq!(err.kind(), "ACTIVE_PARTICIPANT_NOT_FOUND");
    }

    #[tokio::test]
    async fn rejoin_after_leave_creates_a_second_row() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;
        let service = &state.voice_service;

        service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("first join");
        service
            .leave(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("leave");
        service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("second join");

        let history = service
            .list_all_participants(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("history");
        assert_eq!(history.len(), 2);
        assert_ne!(history[0].id, history[1].id);
        assert_eq!(history.iter().filter(|row| row.is_active()).count(), 1);
        assert_eq!(history.iter().filter(|row| !row.is_active()).count(), 1);
    }

    #[tokio::test]
    async fn closed_sessions_reject_joins() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let closed = state
            .voice_service
            .end_session(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("end session");
        assert!(closed.is_closed());

        let err = state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect_err("join closed session");
        assert_eq!(err.kind(), "SESSION_CLOSED");
    }

    #[tokio::test]
    async fn ending_twice_keeps_the_original_timestamp() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let first = state
            .voice_service
            .end_session(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("first end");
        let second = state
            .voice_service
            .end_session(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("second end");

        assert_eq!(first.ended_at, second.ended_at);
        assert!(second.ended_at.is_some());
    }

    #[tokio::test]
    async fn join_validation_order_membership_first() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;

        // Unknown membership wins over the equally unknown session.
        let err = state
            .voice_service
            .join(workspace.id.as_str(), "no-such-session", "no-such-member")
            .await
            .expect_err("join with unknown membership");
        assert_eq!(err.kind(), "MEMBERSHIP_NOT_FOUND");
    }

    #[tokio::test]
    async fn membership_from_another_workspace_is_a_mismatch() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let other_user = seed_user(&state, "other@example.com").await;
        let (_other_ws, other_owner) = state
            .workspace_service
            .create(other_user.id.as_str(), Some("Other Workspace"))
            .await
            .expect("create other workspace");

        let err = state
            .voice_service
            .join(
                workspace.id.as_str(),
                session.id.as_str(),
                other_owner.id.as_str(),
            )
            .await
            .expect_err("cross-workspace membership");
        assert_eq!(err.kind(), "WORKSPACE_MISMATCH");
    }

    #[tokio::test]
    async fn session_from_another_workspace_is_forbidden() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;

        let other_user = seed_user(&state, "other@example.com").await;
        let (other_ws, _other_owner) = state
            .workspace_service
            .create(other_user.id.as_str(), Some("Other Workspace"))
            .await
            .expect("create other workspace");
        let foreign_session = seed_session(&state, other_ws.id.as_str()).await;

        let err = state
            .voice_service
            .join(
                workspace.id.as_str(),
                foreign_session.id.as_str(),
                owner.id.as_str(),
            )
            .await
            .expect_err("cross-workspace session");
        assert_eq!(err.kind(), "SESSION_NOT_IN_WORKSPACE");
    }

    #[tokio::test]
    async fn duplicate_join_is_rejected() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect("first join");
        let err = state
            .voice_service
            .join(workspace.id.as_str(), session.id.as_str(), owner.id.as_str())
            .await
            .expect_err("duplicate join");
        assert_eq!(err.kind(), "ALREADY_JOINED");
    }

    #[tokio::test]
    async fn concurrent_duplicate_joins_have_exactly_one_winner() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let service_a = state.voice_service.clone();
        let service_b = state.voice_service.clone();
        let (ws, sid, mid) = (
            workspace.id.as_str().to_owned(),
            session.id.as_str().to_owned(),
            owner.id.as_str().to_owned(),
        );
        let (ws2, sid2, mid2) = (ws.clone(), sid.clone(), mid.clone());

        let (left, right) = tokio::join!(
            tokio::spawn(async move { service_a.join(&ws, &sid, &mid).await }),
            tokio::spawn(async move { service_b.join(&ws2, &sid2, &mid2).await }),
        );
        let outcomes = [left.expect("task"), right.expect("task")];

        let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = outcomes
            .iter()
            .find_map(|outcome| outcome.as_ref().err())
            .expect("one loser");
        assert_eq!(loser.kind(), "ALREADY_JOINED");

        let active = state
            .voice_service
            .list_active_participants(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("list active");
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn move_drains_the_source_and_fills_the_destination() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let source = seed_session(&state, workspace.id.as_str()).await;
        let destination = seed_session(&state, workspace.id.as_str()).await;

        state
            .voice_service
            .join(workspace.id.as_str(), source.id.as_str(), owner.id.as_str())
            .await
            .expect("join source");

        let moved = state
            .voice_service
            .move_member(
                workspace.id.as_str(),
                source.id.as_str(),
                destination.id.as_str(),
                owner.id.as_str(),
            )
            .await
            .expect("move member");

        assert_eq!(moved.session_id.as_str(), destination.id.as_str());
        assert!(moved.is_active());

        let source_active = state
            .voice_service
            .list_active_participants(workspace.id.as_str(), source.id.as_str())
            .await
            .expect("source active");
        assert!(source_active.is_empty());

        let destination_count = state
            .voice_service
            .count_active_participants(workspace.id.as_str(), destination.id.as_str())
            .await
            .expect("destination count");
        assert_eq!(destination_count, 1);
    }

    #[tokio::test]
    async fn move_succeeds_without_an_active_source_stay() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let source = seed_session(&state, workspace.id.as_str()).await;
        let destination = seed_session(&state, workspace.id.as_str()).await;

        let moved = state
            .voice_service
            .move_member(
                workspace.id.as_str(),
                source.id.as_str(),
                destination.id.as_str(),
                owner.id.as_str(),
            )
            .await
            .expect("move without source stay");

        assert_eq!(moved.session_id.as_str(), destination.id.as_str());
        assert!(moved.is_active());
    }

    #[tokio::test]
    async fn move_propagates_destination_failures() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let source = seed_session(&state, workspace.id.as_str()).await;
        let destination = seed_session(&state, workspace.id.as_str()).await;

        state
            .voice_service
            .end_session(workspace.id.as_str(), destination.id.as_str())
            .await
            .expect("close destination");

        let err = state
            .voice_service
            .move_member(
                workspace.id.as_str(),
                source.id.as_str(),
                destination.id.as_str(),
                owner.id.as_str(),
            )
            .await
            .expect_err("move into closed session");
        assert_eq!(err.kind(), "SESSION_CLOSED");
    }

    #[tokio::test]
    async fn count_always_matches_the_active_list() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        let (_u1, m1) = seed_member(&state, workspace.id.as_str(), "one@example.com").await;
        let (_u2, m2) = seed_member(&state, workspace.id.as_str(), "two@example.com").await;

        for member_id in [owner.id.as_str(), m1.id.as_str(), m2.id.as_str()] {
            state
                .voice_service
                .join(workspace.id.as_str(), session.id.as_str(), member_id)
                .await
                .expect("join");
        }
        state
            .voice_service
            .leave(workspace.id.as_str(), session.id.as_str(), m1.id.as_str())
            .await
            .expect("leave");

        let active = state
            .voice_service
            .list_active_participants(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("active list");
        let count = state
            .voice_service
            .count_active_participants(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("count");

        assert_eq!(count, active.len() as i64);
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn closed_sessions_stay_visible_in_listings() {
        let (_dir, _db, state) = setup_state().await;
        let (_user, workspace, _owner) = seed_workspace(&state).await;
        let session = seed_session(&state, workspace.id.as_str()).await;

        state
            .voice_service
            .end_session(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("end session");

        let sessions = state
            .voice_service
            .list_sessions(workspace.id.as_str())
            .await
            .expect("list sessions");
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_closed());

        let fetched = state
            .voice_service
            .fetch_session(workspace.id.as_str(), session.id.as_str())
            .await
            .expect("fetch session");
        assert!(fetched.is_closed());
    }
}
