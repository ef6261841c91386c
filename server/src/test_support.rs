#![allow(dead_code)]

use corkboard_core::{
    config::AppConfig,
    db::Database,
    user::UserRecord,
    voice::VoiceSessionRecord,
    workspace::WorkspaceRecord,
    workspace_member::WorkspaceMemberRecord,
};
use tempfile::TempDir;

use crate::state::{AppState, build_state};

pub(crate) async fn setup_state() -> (TempDir, Database, AppState) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let mut config = AppConfig::default();
    config.database_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .into_owned();

    let database = Database::connect(&config).await.expect("connect database");
    let state = build_state(&database, config);

    (temp_dir, database, state)
}

pub(crate) async fn seed_user(state: &AppState, email: &str) -> UserRecord {
    state
        .user_store
        .create(email, Some("Tester"))
        .await
        .expect("create user")
}

pub(crate) async fn seed_workspace(
    state: &AppState,
) -> (UserRecord, WorkspaceRecord, WorkspaceMemberRecord) {
    let user = seed_user(state, "tester@example.com").await;
    let (workspace, owner_membership) = state
        .workspace_service
        .create(user.id.as_str(), Some("Test Workspace"))
        .await
        .expect("create workspace");
    (user, workspace, owner_membership)
}

pub(crate) async fn seed_member(
    state: &AppState,
    workspace_id: &str,
    email: &str,
) -> (UserRecord, WorkspaceMemberRecord) {
    let user = seed_user(state, email).await;
    let member = state
        .workspace_service
        .join(workspace_id, user.id.as_str())
        .await
        .expect("join workspace");
    (user, member)
}

pub(crate) async fn seed_session(state: &AppState, workspace_id: &str) -> VoiceSessionRecord {
    state
        .voice_service
        .start_session(workspace_id)
        .await
        .expect("start voice session")
}

pub(crate) async fn bearer_for(state: &AppState, user: &UserRecord) -> String {
    let session = state
        .user_store
        .create_auth_session(user.id.as_str())
        .await
        .expect("create auth session");
    session.token
}
