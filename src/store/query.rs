use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DocumentData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$in")] In,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lte")] Lte,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Conjunction of field filters with optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.into(), op, value: value.into() });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn within(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter(field, FilterOp::In, Value::Array(values))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every filter accepts the document
    pub fn matches(&self, data: &DocumentData) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }

    /// Applies ordering and limit in process
    pub fn arrange<T>(&self, mut items: Vec<T>, data: impl Fn(&T) -> &DocumentData) -> Vec<T> {
        if let Some(order) = &self.order {
            items.sort_by(|a, b| {
                let left = data(a).get(&order.field);
                let right = data(b).get(&order.field);
                // Missing values sort last regardless of direction
                match (left, right) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(l), Some(r)) => {
                        let ord = compare_values(l, r).unwrap_or(Ordering::Equal);
                        match order.direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    }
                }
            });
        }
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
        items
    }
}

impl Filter {
    pub fn matches(&self, data: &DocumentData) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::In => self
                .value
                .as_array()
                .map(|candidates| candidates.iter().any(|c| c == actual))
                .unwrap_or(false),
            FilterOp::Gte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Parses an RFC 3339 timestamp string
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Ordering between two JSON values of compatible kinds.
///
/// Timestamps compare chronologically, numbers numerically, other strings
/// lexicographically. Mixed or non-scalar kinds are incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => match (parse_timestamp(l), parse_timestamp(r)) {
            (Some(lt), Some(rt)) => Some(lt.cmp(&rt)),
            _ => Some(l.cmp(r)),
        },
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
