pub mod auth_handlers;
pub mod canvas_handlers;
pub mod chat_handlers;
pub mod health_handlers;
pub mod voice_handlers;
pub mod workspace_handlers;
