pub mod jwks;
pub mod shared_secret;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{IdentityConfig, IdentityMode};

pub use jwks::JwksVerifier;
pub use shared_secret::SharedSecretVerifier;

/// ID token claims as issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(uid: impl Into<String>, email: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: uid.into(),
            email,
            email_verified: None,
            aud: None,
            iss: None,
            exp,
            iat: now.timestamp(),
        }
    }

    /// The caller's identity id
    pub fn uid(&self) -> &str {
        &self.sub
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid identity configuration: {0}")]
    Misconfigured(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Verifies bearer tokens and yields the caller's claims
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, IdentityError>;
}

/// Builds the verifier selected by configuration
pub fn verifier_from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityVerifier>, IdentityError> {
    match config.mode {
        IdentityMode::SharedSecret => Ok(Arc::new(SharedSecretVerifier::new(&config.jwt_secret)?)),
        IdentityMode::Jwks => {
            if config.project_id.is_empty() {
                return Err(IdentityError::Misconfigured("IDENTITY_PROJECT_ID is required for jwks mode".into()));
            }
            Ok(Arc::new(JwksVerifier::new(
                &config.jwks_url,
                &config.project_id,
                std::time::Duration::from_secs(config.jwks_cache_secs),
            )))
        }
    }
}

fn require_subject(claims: Claims) -> Result<Claims, IdentityError> {
    if claims.sub.trim().is_empty() {
        return Err(IdentityError::MissingSubject);
    }
    Ok(claims)
}
