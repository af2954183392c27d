use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::models::user::{UserDocument, UPDATABLE_FIELDS, USERS};
use crate::models::{format_timestamp, to_document};
use crate::store::{CollectionPath, DocumentData, DocumentStore, StoreError};

/// Profile provisioning and self-service updates on `users/{uid}`
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Writes the initial profile for the caller, replacing any existing one
    pub async fn create(&self, uid: &str, email: Option<&str>, now: DateTime<Utc>) -> ServiceResult<UserDocument> {
        let user = UserDocument::provision(uid, email, now);
        let path = CollectionPath::root(USERS)?.doc(uid)?;

        self.store.set(&path, to_document(&user)?).await?;

        info!("User created: {}", uid);
        Ok(user)
    }

    /// Applies the allow-listed fields of `payload` to the caller's own profile
    /// and returns the applied update (including `updatedAt`)
    pub async fn update(
        &self,
        caller: &str,
        uid: &str,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> ServiceResult<DocumentData> {
        if caller != uid {
            return Err(ServiceError::Forbidden("Unauthorized".into()));
        }

        let payload = payload
            .as_object()
            .ok_or_else(|| ServiceError::InvalidInput("expected a JSON object".into()))?;

        let mut update: DocumentData = payload
            .iter()
            .filter(|(key, _)| UPDATABLE_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if update.is_empty() {
            return Err(ServiceError::InvalidInput("No valid fields to update".into()));
        }
        update.insert("updatedAt".into(), Value::String(format_timestamp(now)));

        let path = CollectionPath::root(USERS)?.doc(uid)?;
        match self.store.update(&path, update.clone()).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => return Err(ServiceError::NotFound(format!("User {} not found", uid))),
            Err(e) => return Err(e.into()),
        }

        info!("User updated: {} ({} fields)", uid, update.len() - 1);
        Ok(update)
    }
}
