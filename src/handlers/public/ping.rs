// handlers/public/ping.rs - GET /ping handler

use axum::Json;
use serde_json::{json, Value};

/// GET /ping - liveness check, never touches the store
pub async fn ping() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "pong"
    }))
}
