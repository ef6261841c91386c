pub mod canvas;
pub mod chat;
pub mod config;
pub mod db;
pub mod ids;
pub mod user;
pub mod voice;
pub mod workspace;
pub mod workspace_member;
