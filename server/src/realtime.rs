use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

pub const EVENT_USER_JOINED: &str = "user-joined";
pub const EVENT_USER_LEFT: &str = "user-left";
pub const EVENT_USER_MOVED: &str = "user-moved";
pub const EVENT_IDEA_CREATED: &str = "idea-created";
pub const EVENT_IDEA_UPDATED: &str = "idea-updated";
pub const EVENT_IDEA_DELETED: &str = "idea-deleted";
pub const EVENT_CHAT_MESSAGE: &str = "chat-message";

pub fn workspace_topic(workspace_id: &str) -> String {
    format!("workspace:{workspace_id}")
}

pub fn canvas_topic(canvas_id: &str) -> String {
    format!("canvas:{canvas_id}")
}

pub fn voice_topic(session_id: &str) -> String {
    format!("voice:{session_id}")
}

#[derive(Clone, Debug)]
pub struct NotificationEvent {
    pub event: String,
    pub payload: JsonValue,
}

/// Outbound fan-out seam. Services hold a sink, not the hub, so tests can
/// capture events and other transports can be swapped in.
pub trait NotificationSink: Send + Sync {
    fn broadcast(&self, topic: &str, event: &str, payload: JsonValue);
}

pub type NotificationSinkRef = Arc<dyn NotificationSink>;

/// Per-topic fan-out of domain events. Subscribers that lag simply miss
/// events; delivery is best effort and never fails the operation that
/// produced the event.
#[derive(Clone)]
pub struct NotificationHub {
    channels: Arc<DashMap<String, broadcast::Sender<NotificationEvent>>>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<NotificationEvent> {
        self.ensure_sender(topic).subscribe()
    }

    pub fn broadcast(&self, topic: &str, event: &str, payload: JsonValue) {
        let sender = self.ensure_sender(topic);
        let _ = sender.send(NotificationEvent {
            event: event.to_owned(),
            payload,
        });
    }

    pub fn remove_topic(&self, topic: &str) {
        self.channels.remove(topic);
    }

    fn ensure_sender(&self, topic: &str) -> broadcast::Sender<NotificationEvent> {
        self.channels
            .entry(topic.to_owned())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(128);
                tx
            })
            .clone()
    }
}

impl NotificationSink for NotificationHub {
    fn broadcast(&self, topic: &str, event: &str, payload: JsonValue) {
        NotificationHub::broadcast(self, topic, event, payload);
    }
}
