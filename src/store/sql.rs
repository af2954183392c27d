use serde_json::Value;

use super::query::{parse_timestamp, Direction, Filter, FilterOp, Query};
use super::{CollectionPath, StoreError, StoreResult};

/// Table holding every document of every collection
pub const DOCUMENTS_TABLE: &str = "documents";

pub const CREATE_DOCUMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
"#;

/// Shape of an RFC 3339 timestamp; only matching strings are cast to `timestamptz`
const TIMESTAMP_PATTERN: &str =
    r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[Tt ]([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$";

/// Bind parameter for a generated statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Json(Value),
}

/// Parameterized SELECT over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

pub struct SqlBuilder {
    params: Vec<SqlParam>,
    conditions: Vec<String>,
}

impl SqlBuilder {
    fn new() -> Self {
        Self { params: vec![], conditions: vec![] }
    }

    /// Compiles a [`Query`] into a SELECT returning `id` and `data`
    pub fn select(collection: &CollectionPath, query: &Query) -> StoreResult<SqlQuery> {
        let mut builder = Self::new();
        let collection_param = builder.push(SqlParam::Text(collection.as_str().to_string()));
        builder.conditions.push(format!("collection = {}", collection_param));

        for filter in &query.filters {
            let condition = builder.condition(filter)?;
            builder.conditions.push(condition);
        }

        let mut sql = format!(
            "SELECT id, data FROM {} WHERE {}",
            DOCUMENTS_TABLE,
            builder.conditions.join(" AND ")
        );

        match &query.order {
            Some(order) => {
                let field = quote_field(&order.field)?;
                let direction = match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                sql.push_str(&format!(" ORDER BY data -> {} {} NULLS LAST, id", field, direction));
            }
            None => sql.push_str(" ORDER BY id"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(SqlQuery { sql, params: builder.params })
    }

    fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn condition(&mut self, filter: &Filter) -> StoreResult<String> {
        let field = quote_field(&filter.field)?;
        match filter.op {
            FilterOp::Eq => {
                let p = self.push(SqlParam::Json(filter.value.clone()));
                Ok(format!("data -> {} = {}", field, p))
            }
            FilterOp::In => {
                if !filter.value.is_array() {
                    return Err(StoreError::InvalidQuery(format!(
                        "$in on '{}' requires an array",
                        filter.field
                    )));
                }
                let p = self.push(SqlParam::Json(filter.value.clone()));
                Ok(format!("(data ? {f} AND {p} @> jsonb_build_array(data -> {f}))", f = field, p = p))
            }
            FilterOp::Gte | FilterOp::Lte => {
                let op = if filter.op == FilterOp::Gte { ">=" } else { "<=" };
                self.range_condition(&field, op, &filter.value)
            }
        }
    }

    fn range_condition(&mut self, field: &str, op: &str, value: &Value) -> StoreResult<String> {
        match value {
            Value::String(s) if parse_timestamp(s).is_some() => {
                let p = self.push(SqlParam::Text(s.clone()));
                // Non-timestamp strings compare as text, same as the in-memory matcher
                Ok(format!(
                    "CASE WHEN jsonb_typeof(data -> {f}) <> 'string' THEN false \
                     WHEN (data ->> {f}) ~ '{re}' THEN (data ->> {f})::timestamptz {op} {p}::timestamptz \
                     ELSE (data ->> {f}) {op} {p} END",
                    f = field, op = op, p = p, re = TIMESTAMP_PATTERN
                ))
            }
            Value::String(s) => {
                let p = self.push(SqlParam::Text(s.clone()));
                Ok(format!(
                    "CASE WHEN jsonb_typeof(data -> {f}) = 'string' THEN (data ->> {f}) {op} {p} ELSE false END",
                    f = field, op = op, p = p
                ))
            }
            Value::Number(n) => {
                let p = self.push(SqlParam::Text(n.to_string()));
                Ok(format!(
                    "CASE WHEN jsonb_typeof(data -> {f}) = 'number' THEN (data ->> {f})::numeric {op} {p}::numeric ELSE false END",
                    f = field, op = op, p = p
                ))
            }
            other => Err(StoreError::InvalidQuery(format!(
                "range comparison on {} requires a string, timestamp or number, got {}",
                field, other
            ))),
        }
    }
}

/// Quotes a field name as a SQL string literal after validating it
pub fn quote_field(field: &str) -> StoreResult<String> {
    let valid = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidQuery(format!("invalid field name '{}'", field)));
    }
    Ok(format!("'{}'", field))
}
