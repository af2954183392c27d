use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{CollectionSummary, ReportError, SchemaReport};
use crate::config::ReporterConfig;
use crate::store::{CollectionPath, DocumentStore, Query};

/// Walks the store from its root collections and builds a [`SchemaReport`].
///
/// Traversal is sequential. Each collection path is sampled at most once per
/// run; the visited set is threaded through the recursion.
pub struct SchemaInspector {
    store: Arc<dyn DocumentStore>,
    config: ReporterConfig,
    /// Candidate reference value -> every top-level collection holding a document with that id
    reference_cache: HashMap<String, Vec<String>>,
}

impl SchemaInspector {
    pub fn new(store: Arc<dyn DocumentStore>, config: ReporterConfig) -> Self {
        Self {
            store,
            config,
            reference_cache: HashMap::new(),
        }
    }

    pub async fn inspect(&mut self) -> Result<SchemaReport, ReportError> {
        let roots = self
            .store
            .list_collections(None)
            .await
            .map_err(ReportError::ListCollections)?;
        info!("Inspecting {} top-level collections", roots.len());

        let mut visited = BTreeSet::new();
        let mut collections = Vec::with_capacity(roots.len());
        for root in &roots {
            if visited.contains(root) {
                continue;
            }
            collections.push(self.inspect_collection(root.clone(), &roots, &mut visited).await);
        }

        Ok(SchemaReport {
            generated_at: Utc::now(),
            collections,
        })
    }

    fn inspect_collection<'a>(
        &'a mut self,
        path: CollectionPath,
        roots: &'a [CollectionPath],
        visited: &'a mut BTreeSet<CollectionPath>,
    ) -> BoxFuture<'a, CollectionSummary> {
        async move {
            visited.insert(path.clone());
            let mut summary = CollectionSummary::new(&path);

            let sample = Query::new().limit(self.config.sample_size);
            let documents = match self.store.query(&path, &sample).await {
                Ok(documents) => documents,
                Err(e) => {
                    warn!("Failed to read collection {}: {}", path, e);
                    summary.error = Some(e.to_string());
                    return summary;
                }
            };
            debug!("Sampled {} documents from {}", documents.len(), path);

            for document in &documents {
                summary.sampled += 1;
                for (field, value) in &document.data {
                    let reference = match value {
                        Value::String(s) => self.resolve_reference(s, &path, roots).await,
                        _ => None,
                    };
                    let entry = summary.fields.entry(field.clone()).or_default();
                    entry.record(value, self.config.max_examples);
                    if let Some(target) = reference {
                        entry.references.insert(target);
                    }
                }
            }

            for document in &documents {
                let children = match self.store.list_collections(Some(&document.path)).await {
                    Ok(children) => children,
                    Err(e) => {
                        warn!("Failed to list sub-collections of {}: {}", document.path, e);
                        summary.error.get_or_insert_with(|| e.to_string());
                        continue;
                    }
                };
                for child in children {
                    if visited.contains(&child) {
                        debug!("Skipping already visited collection {}", child);
                        continue;
                    }
                    let child_summary = self.inspect_collection(child, roots, visited).await;
                    summary.add_subcollection(child_summary, self.config.max_examples);
                }
            }

            summary
        }
        .boxed()
    }

    /// Top-level collection (other than `owner`'s own root) holding a document
    /// whose id equals `value`, for long-enough strings. Lookup failures count as misses.
    async fn resolve_reference(
        &mut self,
        value: &str,
        owner: &CollectionPath,
        roots: &[CollectionPath],
    ) -> Option<String> {
        if value.chars().count() <= self.config.reference_min_length {
            return None;
        }
        let owner_root = owner.as_str().split('/').next().unwrap_or_default();

        if !self.reference_cache.contains_key(value) {
            let holders = self.holders_of(value, roots).await;
            self.reference_cache.insert(value.to_string(), holders);
        }

        // The cache is owner-independent; exclude the owner's root per lookup
        self.reference_cache
            .get(value)
            .and_then(|holders| holders.iter().find(|name| name.as_str() != owner_root))
            .cloned()
    }

    /// Names of the top-level collections holding a document with id `value`
    async fn holders_of(&self, value: &str, roots: &[CollectionPath]) -> Vec<String> {
        let mut holders = Vec::new();
        for root in roots {
            let Ok(path) = root.doc(value) else {
                break;
            };
            match self.store.get(&path).await {
                Ok(Some(_)) => holders.push(root.name().to_string()),
                Ok(None) => {}
                Err(e) => debug!("Reference lookup {} failed: {}", path, e),
            }
        }
        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, DocumentData, DocumentPath, MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use serde_json::json;

    fn config() -> ReporterConfig {
        ReporterConfig::default()
    }

    /// Delegates to a MemoryStore but fails reads of one collection and can
    /// report a bogus sub-collection pointing back at a root
    struct FlakyStore {
        inner: MemoryStore,
        failing: Option<&'static str>,
        cycle_to: Option<&'static str>,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
            self.inner.get(path).await
        }
        async fn set(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
            self.inner.set(path, data).await
        }
        async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
            self.inner.update(path, data).await
        }
        async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
            self.inner.delete(path).await
        }
        async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
            if self.failing == Some(collection.as_str()) {
                return Err(StoreError::Connection("read refused".into()));
            }
            self.inner.query(collection, query).await
        }
        async fn list_collections(&self, parent: Option<&DocumentPath>) -> StoreResult<Vec<CollectionPath>> {
            let mut found = self.inner.list_collections(parent).await?;
            if let (Some(_), Some(root)) = (parent, self.cycle_to) {
                found.push(CollectionPath::root(root)?);
            }
            Ok(found)
        }
        async fn health_check(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn merges_kinds_within_a_collection() {
        let store = MemoryStore::new();
        store.insert("a", "1", json!({"b": "text"})).await.unwrap();
        store.insert("a", "2", json!({"b": 42})).await.unwrap();

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        let a = &report.collections[0];
        assert_eq!(a.sampled, 2);
        let kinds: Vec<String> = a.fields["b"].kinds.iter().map(ToString::to_string).collect();
        assert_eq!(kinds, vec!["string", "number"]);
    }

    #[tokio::test]
    async fn sample_size_bounds_reads() {
        let store = MemoryStore::new();
        for i in 0..8 {
            store.insert("items", &format!("i{}", i), json!({"n": i})).await.unwrap();
        }
        let mut settings = config();
        settings.sample_size = 3;

        let report = SchemaInspector::new(Arc::new(store), settings).inspect().await.unwrap();
        assert_eq!(report.collections[0].sampled, 3);
    }

    #[tokio::test]
    async fn one_failing_collection_does_not_abort_the_run() {
        let inner = MemoryStore::new();
        inner.insert("broken", "x", json!({"f": 1})).await.unwrap();
        inner.insert("users", "u1", json!({"email": "a@b.c"})).await.unwrap();
        let store = FlakyStore {
            inner,
            failing: Some("broken"),
            cycle_to: None,
        };

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        assert_eq!(report.collections.len(), 2);
        let broken = report.collections.iter().find(|c| c.name == "broken").unwrap();
        assert!(broken.error.is_some());
        let users = report.collections.iter().find(|c| c.name == "users").unwrap();
        assert!(users.fields.contains_key("email"));
        assert_eq!(report.failures().len(), 1);
    }

    #[tokio::test]
    async fn visited_collections_are_not_revisited() {
        let inner = MemoryStore::new();
        inner.insert("conversations", "c1", json!({"participants": ["u1"]})).await.unwrap();
        let store = FlakyStore {
            inner,
            failing: None,
            cycle_to: Some("conversations"),
        };

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        assert_eq!(report.collections.len(), 1);
        assert!(report.collections[0].subcollections.is_empty());
    }

    #[tokio::test]
    async fn subcollections_merge_by_name() {
        let store = MemoryStore::new();
        store.insert("conversations", "c1", json!({"participants": []})).await.unwrap();
        store.insert("conversations", "c2", json!({"participants": []})).await.unwrap();
        store
            .insert("conversations/c1/messages", "m1", json!({"content": "hi"}))
            .await
            .unwrap();
        store
            .insert("conversations/c2/messages", "m2", json!({"content": "yo", "readBy": ["u"]}))
            .await
            .unwrap();

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        let conversations = &report.collections[0];
        assert_eq!(conversations.subcollections.len(), 1);
        let messages = &conversations.subcollections[0];
        assert_eq!(messages.name, "messages");
        assert_eq!(messages.sampled, 2);
        assert!(messages.fields.contains_key("readBy"));
    }

    #[tokio::test]
    async fn long_ids_of_other_collections_become_references() {
        let store = MemoryStore::new();
        let establishment = "establishment-0001-paris";
        store.insert("establishments", establishment, json!({"name": "Clinic"})).await.unwrap();
        store
            .insert(
                "replacements",
                "r1",
                json!({"establishmentId": establishment, "status": "open", "note": "no such document here"}),
            )
            .await
            .unwrap();

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        let replacements = report.collections.iter().find(|c| c.name == "replacements").unwrap();
        assert!(replacements.fields["establishmentId"].references.contains("establishments"));
        assert!(replacements.fields["status"].references.is_empty());
        assert!(replacements.fields["note"].references.is_empty());
    }

    #[tokio::test]
    async fn reference_lookups_never_point_back_at_the_owner() {
        let store = MemoryStore::new();
        let uid = "user-0001-alice-martin";
        store.insert("conversations", "c1", json!({"participants": [uid]})).await.unwrap();
        store
            .insert("conversations/c1/messages", "m1", json!({"senderId": uid}))
            .await
            .unwrap();
        store.insert("users", uid, json!({"uid": uid})).await.unwrap();

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        let users = report.collections.iter().find(|c| c.name == "users").unwrap();
        assert!(users.fields["uid"].references.is_empty());
        let messages = &report.collections.iter().find(|c| c.name == "conversations").unwrap().subcollections[0];
        assert!(messages.fields["senderId"].references.contains("users"));
    }

    #[tokio::test]
    async fn self_lookups_do_not_hide_later_references() {
        let store = MemoryStore::new();
        let establishment = "establishment-0002-lyon";
        store
            .insert("establishments", establishment, json!({"selfId": establishment}))
            .await
            .unwrap();
        store
            .insert("replacements", "r1", json!({"establishmentId": establishment}))
            .await
            .unwrap();

        let report = SchemaInspector::new(Arc::new(store), config()).inspect().await.unwrap();
        let establishments = report.collections.iter().find(|c| c.name == "establishments").unwrap();
        assert!(establishments.fields["selfId"].references.is_empty());
        let replacements = report.collections.iter().find(|c| c.name == "replacements").unwrap();
        assert!(replacements.fields["establishmentId"].references.contains("establishments"));
    }
}
