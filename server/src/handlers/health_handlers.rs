use axum::Json;
use serde_json::{Value as JsonValue, json};

pub async fn health_handler() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
