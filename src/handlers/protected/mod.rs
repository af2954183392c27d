// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind identity_middleware, so handlers can rely on an
// AuthUser extension being present.

pub mod message;
pub mod replacement;
pub mod user;

pub use message::{delete_message, send_message};
pub use replacement::search_replacements;
pub use user::{create_user, update_user};

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use crate::error::ApiError;

/// Unwraps a JSON body, turning axum's rejection into the API error envelope
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))),
    }
}
