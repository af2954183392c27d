pub mod message_service;
pub mod replacement_service;
pub mod user_service;

use thiserror::Error;

use crate::store::StoreError;

pub use message_service::MessageService;
pub use replacement_service::ReplacementService;
pub use user_service::UserService;

/// Failures of the request-level services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed stored document: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Names of `fields` whose value is absent or blank
pub(crate) fn missing<'a>(fields: &[(&'static str, Option<&'a str>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|(name, _)| *name)
        .collect()
}
