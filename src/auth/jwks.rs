use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{require_subject, Claims, IdentityError, IdentityVerifier};

/// Minimum spacing between refreshes triggered by an unknown `kid`
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies RS256 ID tokens against the identity provider's published JWK set.
///
/// Keys are cached for `cache_ttl`. A token signed with an unknown `kid`
/// forces a refresh before it is rejected, at most once per
/// `MIN_REFRESH_INTERVAL`; inside that window it is rejected from the cache.
pub struct JwksVerifier {
    client: reqwest::Client,
    jwks_url: String,
    project_id: String,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksVerifier {
    pub fn new(jwks_url: &str, project_id: &str, cache_ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_url: jwks_url.to_string(),
            project_id: project_id.to_string(),
            cache_ttl,
            cache: RwLock::new(None),
        }
    }

    /// Starts with a known key set (tests, air-gapped deployments)
    pub fn with_keys(mut self, keys: JwkSet) -> Self {
        self.cache = RwLock::new(Some(CachedKeys { keys, fetched_at: Instant::now() }));
        self
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| IdentityError::InvalidToken(e.to_string()));
                    }
                    if age < MIN_REFRESH_INTERVAL {
                        debug!("Unknown key {} within refresh interval, not refetching", kid);
                        return Err(IdentityError::UnknownKey(kid.to_string()));
                    }
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys { keys, fetched_at: Instant::now() });

        key.ok_or_else(|| IdentityError::UnknownKey(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, IdentityError> {
        debug!("Fetching identity provider keys from {}", self.jwks_url);
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!("Failed to fetch identity provider keys: {}", e);
                IdentityError::ProviderUnavailable(e.to_string())
            })?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| IdentityError::ProviderUnavailable(format!("malformed key set: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("token header has no kid".into()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);

        let token_data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        require_subject(token_data.claims)
    }
}
