//! Schema-inference reporter.
//!
//! Samples documents from every collection reachable from the store root,
//! classifies field values and renders the merged picture as markdown. The
//! store is schemaless, so everything here is inferred from samples and only
//! as good as the sample.

pub mod descriptions;
pub mod inspector;
pub mod kind;
pub mod render;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::store::{CollectionPath, StoreError};

pub use descriptions::{FieldDescriptions, CUSTOM_FIELD};
pub use inspector::SchemaInspector;
pub use kind::FieldKind;
pub use render::render_markdown;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to list top-level collections: {0}")]
    ListCollections(#[source] StoreError),

    #[error("failed to read field descriptions from {path}: {source}")]
    DescriptionsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid field descriptions in {path}: {source}")]
    DescriptionsFormat {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Everything observed about one field across the sampled documents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSummary {
    pub kinds: BTreeSet<FieldKind>,
    pub examples: Vec<Value>,
    /// Top-level collections a value of this field was found to identify
    pub references: BTreeSet<String>,
}

impl FieldSummary {
    pub fn record(&mut self, value: &Value, max_examples: usize) {
        self.kinds.insert(FieldKind::classify(value));
        if self.examples.len() < max_examples && !value.is_null() && !self.examples.contains(value) {
            self.examples.push(value.clone());
        }
    }

    fn merge(&mut self, other: FieldSummary, max_examples: usize) {
        self.kinds.extend(other.kinds);
        self.references.extend(other.references);
        for example in other.examples {
            if self.examples.len() >= max_examples {
                break;
            }
            if !self.examples.contains(&example) {
                self.examples.push(example);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    /// Path of the first collection merged into this summary
    pub path: String,
    pub name: String,
    pub sampled: usize,
    pub fields: BTreeMap<String, FieldSummary>,
    pub subcollections: Vec<CollectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionSummary {
    pub fn new(path: &CollectionPath) -> Self {
        Self {
            path: path.as_str().to_string(),
            name: path.name().to_string(),
            sampled: 0,
            fields: BTreeMap::new(),
            subcollections: Vec::new(),
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Folds a same-named summary (e.g. `messages` under another conversation) into this one
    pub fn merge(&mut self, other: CollectionSummary, max_examples: usize) {
        self.sampled += other.sampled;
        for (field, summary) in other.fields {
            self.fields.entry(field).or_default().merge(summary, max_examples);
        }
        for child in other.subcollections {
            self.add_subcollection(child, max_examples);
        }
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    pub fn add_subcollection(&mut self, child: CollectionSummary, max_examples: usize) {
        match self.subcollections.iter_mut().find(|existing| existing.name == child.name) {
            Some(existing) => existing.merge(child, max_examples),
            None => self.subcollections.push(child),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub generated_at: DateTime<Utc>,
    pub collections: Vec<CollectionSummary>,
}

impl SchemaReport {
    /// Collections whose read failed, as `(path, error)` pairs, depth first
    pub fn failures(&self) -> Vec<(&str, &str)> {
        fn walk<'a>(summary: &'a CollectionSummary, out: &mut Vec<(&'a str, &'a str)>) {
            if let Some(error) = &summary.error {
                out.push((summary.path.as_str(), error.as_str()));
            }
            for child in &summary.subcollections {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for summary in &self.collections {
            walk(summary, &mut out);
        }
        out
    }
}
