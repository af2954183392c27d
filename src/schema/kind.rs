use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::store::query::parse_timestamp;

/// Observed type of a field value.
///
/// The derived ordering fixes the order kinds are listed in reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Object,
    /// Element kind taken from the first element; `None` for an empty array
    Array(Option<Box<FieldKind>>),
    String,
    Number,
    Boolean,
    /// String that parses as RFC 3339
    Timestamp,
    Null,
    Unknown,
}

impl FieldKind {
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Object(_) => FieldKind::Object,
            Value::Array(items) => FieldKind::Array(items.first().map(|first| Box::new(FieldKind::classify(first)))),
            Value::String(s) if parse_timestamp(s).is_some() => FieldKind::Timestamp,
            Value::String(_) => FieldKind::String,
            Value::Number(_) => FieldKind::Number,
            Value::Bool(_) => FieldKind::Boolean,
            Value::Null => FieldKind::Null,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Object => write!(f, "object"),
            FieldKind::Array(Some(element)) => write!(f, "array<{}>", element),
            FieldKind::Array(None) => write!(f, "array"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Timestamp => write!(f, "timestamp"),
            FieldKind::Null => write!(f, "null"),
            FieldKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
