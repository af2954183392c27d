// handlers/protected/replacement.rs - POST /search_replacements handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;

use super::json_body;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::SearchRequest;
use crate::services::ReplacementService;
use crate::state::AppState;

/// POST /search_replacements - postings for a profession, optionally narrowed by
/// establishments, start-date range and specialties
///
/// Request body:
/// ```json
/// {
///   "professionId": "nurse",
///   "establishmentIds": ["e1"],
///   "startDate": "2025-03-01T00:00:00Z",
///   "endDate": "2025-03-31T23:59:59Z",
///   "specialtyIds": ["cardio"]
/// }
/// ```
pub async fn search_replacements(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Vec<Value>> {
    let request: SearchRequest = serde_json::from_value(json_body(body)?)
        .map_err(|e| ApiError::bad_request(format!("Invalid search request: {}", e)))?;

    tracing::debug!("Replacement search by {}", user.uid);
    let service = ReplacementService::new(state.store.clone());
    let results = service.search(&request).await?;
    Ok(ApiResponse::success(results))
}
