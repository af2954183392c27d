// handlers/public/root.rs - GET / handler

use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "ELIO API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Replacement marketplace backend for healthcare professionals",
            "endpoints": {
                "ping": "GET /ping (public)",
                "health": "GET /health (public)",
                "create_user": "POST /create_user (protected)",
                "update_user": "PUT /update_user/:uid (protected)",
                "search_replacements": "POST /search_replacements (protected)",
                "send_message": "POST /send_message (protected)",
                "delete_message": "DELETE /delete_message/:conversation_id/:message_id (protected)",
            }
        }
    }))
}
