pub mod auth;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod realtime;
pub mod router;
pub mod state;
pub mod types;
pub mod voice;
pub mod workspace;

pub use state::{AppState, build_state};

#[cfg(test)]
pub mod test_support;
