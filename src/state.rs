use std::sync::Arc;

use anyhow::Context;

use crate::auth::{verifier_from_config, IdentityVerifier};
use crate::config::{AppConfig, StoreBackend};
use crate::store::{connect_with_retry, DocumentStore, MemoryStore};

/// Shared handles every request handler receives
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, identity }
    }

    /// Builds the store backend and identity verifier named by `config`
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = open_store(config).await?;
        let identity = verifier_from_config(&config.identity).context("failed to set up identity verification")?;
        Ok(Self::new(store, identity))
    }
}

/// Opens the configured document store, retrying Postgres connections
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = connect_with_retry(&config.store)
                .await
                .context("failed to connect to the document store")?;
            Ok(Arc::new(store))
        }
    }
}
