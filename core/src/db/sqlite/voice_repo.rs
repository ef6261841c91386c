use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::voice_repo::VoiceRepository,
    ids::{MemberId, UserId, VoiceSessionId, WorkspaceId},
    voice::{VoiceParticipantRecord, VoiceParticipantWithMember, VoiceSessionRecord},
};

pub struct SqliteVoiceRepository {
    pool: Pool<Sqlite>,
}

impl SqliteVoiceRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_session_row(row: SqliteRow) -> VoiceSessionRecord {
        VoiceSessionRecord {
            id: VoiceSessionId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
        }
    }

    fn map_participant_row(row: SqliteRow) -> VoiceParticipantRecord {
        VoiceParticipantRecord {
            id: row.get("id"),
            session_id: VoiceSessionId::from(row.get::<String, _>("session_id")),
            member_id: MemberId::from(row.get::<String, _>("member_id")),
            joined_at: row.get("joined_at"),
            left_at: row.get("left_at"),
        }
    }

    fn map_participant_with_member_row(row: SqliteRow) -> VoiceParticipantWithMember {
        VoiceParticipantWithMember {
            id: row.get("id"),
            session_id: VoiceSessionId::from(row.get::<String, _>("session_id")),
            member_id: MemberId::from(row.get::<String, _>("member_id")),
            joined_at: row.get("joined_at"),
            left_at: row.get("left_at"),
            member_workspace_id: WorkspaceId::from(row.get::<String, _>("member_workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            user_email: row.get("user_email"),
            user_name: row.get("user_name"),
        }
    }
}

const PARTICIPANT_WITH_MEMBER_SELECT: &str = "SELECT
     vp.id,
     vp.session_id,
     vp.member_id,
     vp.joined_at,
     vp.left_at,
     wm.workspace_id AS member_workspace_id,
     wm.user_id,
     u.email AS user_email,
     u.name AS user_name
 FROM voice_session_participants vp
 JOIN workspace_members wm ON wm.id = vp.member_id
 JOIN users u ON u.id = wm.user_id";

#[async_trait]
impl VoiceRepository for SqliteVoiceRepository {
    async fn insert_session(&self, session: VoiceSessionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO voice_sessions (id, workspace_id, started_at, ended_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(session.id.as_str())
        .bind(session.workspace_id.as_str())
        .bind(session.started_at)
        .bind(session.ended_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_session(&self, id: &str) -> Result<Option<VoiceSessionRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, started_at, ended_at FROM voice_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_session_row))
    }

    async fn close_session(&self, id: &str, ended_at: i64) -> Result<bool> {
        // The ended_at IS NULL guard keeps the first close timestamp.
        let result = sqlx::query(
            "UPDATE voice_sessions SET ended_at = ? WHERE id = ? AND ended_at IS NULL",
        )
        .bind(ended_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sessions(&self, workspace_id: &str) -> Result<Vec<VoiceSessionRecord>> {
        let rows = sqlx::query(
            "SELECT id, workspace_id, started_at, ended_at
             FROM voice_sessions
             WHERE workspace_id = ?
             ORDER BY started_at DESC, id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Self::map_session_row).collect())
    }

    async fn insert_participant(&self, participant: VoiceParticipantRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO voice_session_participants (id, session_id, member_id, joined_at, left_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&participant.id)
        .bind(participant.session_id.as_str())
        .bind(participant.member_id.as_str())
        .bind(participant.joined_at)
        .bind(participant.left_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_active_participant(
        &self,
        session_id: &str,
        member_id: &str,
    ) -> Result<Option<VoiceParticipantRecord>> {
        let row = sqlx::query(
            "SELECT id, session_id, member_id, joined_at, left_at
             FROM voice_session_participants
             WHERE session_id = ? AND member_id = ? AND left_at IS NULL",
        )
        .bind(session_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::map_participant_row))
    }

    async fn mark_departed(&self, participant_id: &str, left_at: i64) -> Result<bool> {
        // Departure is one-way. Rows with left_at already set are untouched.
        let result = sqlx::query(
            "UPDATE voice_session_participants SET left_at = ?
             WHERE id = ? AND left_at IS NULL",
        )
        .bind(left_at)
        .bind(participant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_participant_with_member(
        &self,
        participant_id: &str,
    ) -> Result<Option<VoiceParticipantWithMember>> {
        let query = format!("{PARTICIPANT_WITH_MEMBER_SELECT} WHERE vp.id = ?");
        let row = sqlx::query(&query)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Self::map_participant_with_member_row))
    }

    async fn list_participants(
        &self,
        session_id: &str,
        active_only: bool,
    ) -> Result<Vec<VoiceParticipantWithMember>> {
        let query = if active_only {
            format!(
                "{PARTICIPANT_WITH_MEMBER_SELECT}
                 WHERE vp.session_id = ? AND vp.left_at IS NULL
                 ORDER BY vp.joined_at ASC, vp.id ASC"
            )
        } else {
            format!(
                "{PARTICIPANT_WITH_MEMBER_SELECT}
                 WHERE vp.session_id = ?
                 ORDER BY vp.joined_at ASC, vp.id ASC"
            )
        };
        let rows = sqlx::query(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(Self::map_participant_with_member_row)
            .collect())
    }

    async fn count_active(&self, session_id: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS active_count
             FROM voice_session_participants
             WHERE session_id = ? AND left_at IS NULL",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("active_count"))
    }
}
