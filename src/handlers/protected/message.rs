// handlers/protected/message.rs - POST /send_message and DELETE /delete_message handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::MessageDocument;
use crate::services::MessageService;
use crate::state::AppState;

/// POST /send_message - post into a conversation the caller participates in
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MessageDocument> {
    let payload = json_body(body)?;
    let service = MessageService::new(state.store.clone());
    let message = service.send(&user.uid, &payload, Utc::now()).await?;
    Ok(ApiResponse::created(message))
}

/// DELETE /delete_message/:conversation_id/:message_id - remove one of the caller's messages
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((conversation_id, message_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let service = MessageService::new(state.store.clone());
    service.delete(&user.uid, &conversation_id, &message_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "Message deleted",
        "conversationId": conversation_id,
        "messageId": message_id,
    })))
}
