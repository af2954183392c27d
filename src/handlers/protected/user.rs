// handlers/protected/user.rs - POST /create_user and PUT /update_user/:uid handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;

use super::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::UserDocument;
use crate::services::UserService;
use crate::state::AppState;

/// POST /create_user - provision the caller's profile from their token identity
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserDocument> {
    let service = UserService::new(state.store.clone());
    let created = service.create(&user.uid, user.email.as_deref(), Utc::now()).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /update_user/:uid - update allow-listed fields of the caller's own profile
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let payload = json_body(body)?;
    let service = UserService::new(state.store.clone());
    let applied = service.update(&user.uid, &uid, &payload, Utc::now()).await?;
    Ok(ApiResponse::success(Value::Object(applied)))
}
