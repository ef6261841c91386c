use std::sync::Arc;

use corkboard_core::{
    canvas::CanvasStore, chat::ChatStore, config::AppConfig, db::Database, user::UserStore,
    voice::VoiceStore, workspace::WorkspaceStore,
};

use crate::{
    oauth::OAuthService,
    realtime::{NotificationHub, NotificationSinkRef},
    voice::VoiceService,
    workspace::WorkspaceService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_store: UserStore,
    pub canvas_store: CanvasStore,
    pub chat_store: ChatStore,
    pub workspace_service: WorkspaceService,
    pub voice_service: VoiceService,
    pub notifications: NotificationHub,
    pub oauth: OAuthService,
}

pub fn build_state(database: &Database, config: AppConfig) -> AppState {
    let notifications = NotificationHub::new();
    let sink: NotificationSinkRef = Arc::new(notifications.clone());

    let workspace_store = WorkspaceStore::new(database);
    let voice_store = VoiceStore::new(database);

    let oauth = OAuthService::new(&public_base_url(&config));

    AppState {
        config: Arc::new(config),
        user_store: UserStore::new(database),
        canvas_store: CanvasStore::new(database),
        chat_store: ChatStore::new(database),
        workspace_service: WorkspaceService::new(workspace_store.clone()),
        voice_service: VoiceService::new(voice_store, workspace_store, sink),
        notifications,
        oauth,
    }
}

/// Externally reachable base URL, used to build the OAuth redirect. Falls
/// back to the bind address for local setups.
fn public_base_url(config: &AppConfig) -> String {
    std::env::var("CORKBOARD_PUBLIC_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| format!("http://{}", config.bind_address))
}
