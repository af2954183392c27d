use std::collections::BTreeSet;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{info, warn};

use super::sql::{SqlBuilder, SqlParam, CREATE_DOCUMENTS_TABLE};
use super::{
    CollectionPath, Document, DocumentData, DocumentPath, DocumentStore, Query, StoreError, StoreResult,
};
use crate::config::StoreConfig;

/// Document store backed by a single JSONB table in Postgres
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Opens a pool from `database_url` and creates the documents table if needed
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        info!("Connected document store at {}", redact_url(url));
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

fn into_object(value: Value, path: &str) -> StoreResult<DocumentData> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidQuery(format!(
            "document {} is not an object: {}",
            path, other
        ))),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(path.collection.as_str())
            .bind(&path.id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: Value = row.try_get("data")?;
                Ok(Some(Document {
                    path: path.clone(),
                    data: into_object(data, &path.to_string())?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .bind(Value::Object(data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .bind(Value::Object(data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(path.collection.as_str())
            .bind(&path.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
        let compiled = SqlBuilder::select(collection, query)?;

        let mut statement = sqlx::query(&compiled.sql);
        for param in compiled.params {
            statement = match param {
                SqlParam::Text(text) => statement.bind(text),
                SqlParam::Json(json) => statement.bind(json),
            };
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| -> StoreResult<Document> {
                let id: String = row.try_get("id")?;
                let data: Value = row.try_get("data")?;
                let path = DocumentPath::new(collection.clone(), &id)?;
                let data = into_object(data, &path.to_string())?;
                Ok(Document { path, data })
            })
            .collect()
    }

    async fn list_collections(&self, parent: Option<&DocumentPath>) -> StoreResult<Vec<CollectionPath>> {
        let mut found = BTreeSet::new();

        match parent {
            None => {
                let rows = sqlx::query(
                    "SELECT DISTINCT split_part(collection, '/', 1) AS name FROM documents ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await?;
                for row in rows {
                    let name: String = row.try_get("name")?;
                    found.insert(CollectionPath::root(&name)?);
                }
            }
            Some(doc) => {
                let prefix = format!("{}/", doc);
                let rows = sqlx::query(
                    "SELECT DISTINCT collection FROM documents WHERE left(collection, length($1)) = $1",
                )
                .bind(&prefix)
                .fetch_all(&self.pool)
                .await?;
                for row in rows {
                    let collection: String = row.try_get("collection")?;
                    if let Some(rest) = collection.strip_prefix(&prefix) {
                        let name = rest.split('/').next().unwrap_or_default();
                        found.insert(doc.subcollection(name)?);
                    }
                }
            }
        }

        Ok(found.into_iter().collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Connects to Postgres, retrying with a fixed wait until the total timeout elapses
pub async fn connect_with_retry(config: &StoreConfig) -> StoreResult<PgDocumentStore> {
    retry_until(
        Duration::from_secs(config.connect_retry_wait_secs),
        Duration::from_secs(config.connect_total_timeout_secs),
        || PgDocumentStore::connect(config),
    )
    .await
}

/// Runs `attempt` until it succeeds or `total` has elapsed, sleeping `wait`
/// between failures. Configuration errors are returned immediately.
pub async fn retry_until<T, F, Fut>(wait: Duration, total: Duration, mut attempt: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let deadline = Instant::now() + total;
    let mut tries = 0u32;

    loop {
        tries += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e @ StoreError::ConfigMissing(_)) => return Err(e),
            Err(e) => {
                if Instant::now() + wait > deadline {
                    warn!("Giving up on document store after {} attempts: {}", tries, e);
                    return Err(e);
                }
                warn!("Document store connection attempt {} failed: {}; retrying in {:?}", tries, e, wait);
                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// Masks the password of a connection URL for logging
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
