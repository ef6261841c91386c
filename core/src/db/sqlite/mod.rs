pub mod canvas_repo;
pub mod chat_repo;
pub mod connection;
pub mod user_repo;
pub mod voice_repo;
pub mod workspace_repo;
