use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    CollectionPath, Document, DocumentData, DocumentPath, DocumentStore, Query, StoreError, StoreResult,
};

type Collections = BTreeMap<CollectionPath, BTreeMap<String, DocumentData>>;

/// In-process document store used for development and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document, building the path from a collection string
    pub async fn insert(&self, collection: &str, id: &str, data: serde_json::Value) -> StoreResult<()> {
        let path = CollectionPath::parse(collection)?.doc(id)?;
        let data = match data {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "document body must be an object, got {}",
                    other
                )))
            }
        };
        self.set(&path, data).await
    }

    pub async fn len(&self, collection: &CollectionPath) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(BTreeMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .map(|data| Document { path: path.clone(), data: data.clone() }))
    }

    async fn set(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), data);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(&path.collection)
            .and_then(|docs| docs.get_mut(&path.id))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        for (key, value) in data {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&path.collection) {
            docs.remove(&path.id);
            if docs.is_empty() {
                collections.remove(&path.collection);
            }
        }
        Ok(())
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(vec![]);
        };

        let matched: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| Document {
                path: DocumentPath { collection: collection.clone(), id: id.clone() },
                data: data.clone(),
            })
            .collect();

        Ok(query.arrange(matched, |doc| &doc.data))
    }

    async fn list_collections(&self, parent: Option<&DocumentPath>) -> StoreResult<Vec<CollectionPath>> {
        let collections = self.collections.read().await;
        let mut found = BTreeSet::new();

        match parent {
            None => {
                for path in collections.keys() {
                    let root = path.as_str().split('/').next().unwrap_or_default();
                    found.insert(CollectionPath::root(root)?);
                }
            }
            Some(doc) => {
                let prefix = format!("{}/", doc);
                for path in collections.keys() {
                    if let Some(rest) = path.as_str().strip_prefix(&prefix) {
                        let name = rest.split('/').next().unwrap_or_default();
                        found.insert(doc.subcollection(name)?);
                    }
                }
            }
        }

        Ok(found.into_iter().collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_update_delete() {
        let store = MemoryStore::new();
        let users = CollectionPath::root("users").unwrap();
        let path = users.doc("u1").unwrap();

        store.insert("users", "u1", json!({"email": "a@b.c", "onboardingStep": 0})).await.unwrap();

        let mut patch = DocumentData::new();
        patch.insert("onboardingStep".into(), json!(2));
        store.update(&path, patch).await.unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.get("onboardingStep"), Some(&json!(2)));
        assert_eq!(doc.get_str("email"), Some("a@b.c"));

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let path = CollectionPath::root("users").unwrap().doc("nobody").unwrap();
        let err = store.update(&path, DocumentData::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_root_and_subcollections() {
        let store = MemoryStore::new();
        store.insert("users", "u1", json!({})).await.unwrap();
        store.insert("conversations", "c1", json!({})).await.unwrap();
        store.insert("conversations/c1/messages", "m1", json!({})).await.unwrap();

        let roots = store.list_collections(None).await.unwrap();
        let names: Vec<&str> = roots.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["conversations", "users"]);

        let c1 = CollectionPath::root("conversations").unwrap().doc("c1").unwrap();
        let subs = store.list_collections(Some(&c1)).await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].as_str(), "conversations/c1/messages");
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store.insert("messages", "m1", json!({"createdAt": "2025-01-01T00:00:00Z", "t": "user"})).await.unwrap();
        store.insert("messages", "m2", json!({"createdAt": "2025-01-03T00:00:00Z", "t": "user"})).await.unwrap();
        store.insert("messages", "m3", json!({"createdAt": "2025-01-02T00:00:00Z", "t": "mission"})).await.unwrap();

        let messages = CollectionPath::root("messages").unwrap();
        let query = Query::new().eq("t", "user").order_by("createdAt", Direction::Desc).limit(1);
        let docs = store.query(&messages, &query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "m2");
    }
}
