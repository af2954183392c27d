use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::{require_subject, Claims, IdentityError, IdentityVerifier};

/// HS256 verifier for development deployments and tests
pub struct SharedSecretVerifier {
    decoding_key: DecodingKey,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Result<Self, IdentityError> {
        if secret.is_empty() {
            return Err(IdentityError::Misconfigured("JWT secret not configured".into()));
        }
        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        let mut validation = Validation::default();
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        require_subject(token_data.claims)
    }
}

/// Signs claims with the shared secret
pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, IdentityError> {
    if secret.is_empty() {
        return Err(IdentityError::Misconfigured("JWT secret not configured".into()));
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| IdentityError::TokenGeneration(e.to_string()))
}
