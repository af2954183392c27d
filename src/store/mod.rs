//! Document store abstraction.
//!
//! Collections hold schemaless JSON documents; a document may own nested
//! sub-collections (messages live under `conversations/{id}/messages`).
//! Handlers and the schema reporter only see the [`DocumentStore`] trait, so the
//! same code runs against [`MemoryStore`] in tests and [`PgDocumentStore`] in
//! deployments.

pub mod memory;
pub mod postgres;
pub mod query;
pub mod sql;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::{connect_with_retry, PgDocumentStore};
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};

/// JSON object stored as a document body
pub type DocumentData = Map<String, Value>;

/// Errors from document store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Slash-separated collection path with an odd number of segments,
/// e.g. `conversations` or `conversations/c1/messages`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn parse(path: &str) -> StoreResult<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(format!("empty segment in '{}'", path)));
        }
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "'{}' names a document, not a collection",
                path
            )));
        }
        Ok(Self(path.to_string()))
    }

    /// Top-level collection; names containing '/' are rejected
    pub fn root(name: &str) -> StoreResult<Self> {
        if name.contains('/') {
            return Err(StoreError::InvalidPath(format!("'{}' is not a top-level collection", name)));
        }
        Self::parse(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment: the collection's own name
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn is_root(&self) -> bool {
        !self.0.contains('/')
    }

    /// Number of collection levels (1 for top-level collections)
    pub fn depth(&self) -> usize {
        self.0.split('/').count() / 2 + 1
    }

    pub fn doc(&self, id: &str) -> StoreResult<DocumentPath> {
        DocumentPath::new(self.clone(), id)
    }

    pub fn parent(&self) -> Option<DocumentPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        let (collection, id) = parent.rsplit_once('/').unwrap_or(("", parent));
        if collection.is_empty() {
            return None;
        }
        Some(DocumentPath {
            collection: CollectionPath(collection.to_string()),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document address: its collection plus its id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl DocumentPath {
    pub fn new(collection: CollectionPath, id: &str) -> StoreResult<Self> {
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::InvalidPath(format!("invalid document id '{}'", id)));
        }
        Ok(Self { collection, id: id.to_string() })
    }

    pub fn subcollection(&self, name: &str) -> StoreResult<CollectionPath> {
        CollectionPath::parse(&format!("{}/{}", self, name))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub data: DocumentData,
}

impl Document {
    pub fn id(&self) -> &str {
        &self.path.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Document body with its id injected under `id`
    pub fn into_json_with_id(self) -> Value {
        let mut data = self.data;
        data.entry("id").or_insert_with(|| Value::String(self.path.id.clone()));
        Value::Object(data)
    }
}

/// Port for schemaless document persistence.
///
/// Writes are atomic per document; nothing here coordinates multiple documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document, `None` when absent
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Creates or replaces a document
    async fn set(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()>;

    /// Merges top-level fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the document does not exist.
    async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()>;

    /// Removes a single document; its sub-collections are left in place
    async fn delete(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Runs a filtered, ordered, bounded read over one collection
    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>>;

    /// Top-level collections when `parent` is `None`, otherwise the
    /// sub-collections of that document
    async fn list_collections(&self, parent: Option<&DocumentPath>) -> StoreResult<Vec<CollectionPath>>;

    async fn health_check(&self) -> StoreResult<()>;

    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
