//! Typed views over the documents the API reads and writes.
//!
//! Field names are camelCase both on the wire and in the store.

pub mod conversation;
pub mod message;
pub mod replacement;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::store::query::parse_timestamp;
use crate::store::DocumentData;

pub use conversation::{Conversation, LastMessage};
pub use message::{Attachment, MessageDocument, MessageType, SendMessageRequest};
pub use replacement::SearchRequest;
pub use user::UserDocument;

/// Canonical stored form of a timestamp: RFC 3339, UTC, millisecond precision
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Rewrites a parseable timestamp field in canonical form; other values are left alone
pub fn normalize_timestamp_field(data: &mut DocumentData, field: &str) {
    if let Some(Value::String(raw)) = data.get(field) {
        if let Some(at) = parse_timestamp(raw) {
            data.insert(field.to_string(), Value::String(format_timestamp(at)));
        }
    }
}

/// Serde adapter writing `DateTime<Utc>` in canonical form
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::store::query::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}

/// Converts a typed model into a store document body
pub fn to_document<T: serde::Serialize>(model: &T) -> Result<DocumentData, serde_json::Error> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        _ => Err(serde::ser::Error::custom("model did not serialize to an object")),
    }
}
