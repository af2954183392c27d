use serde::{Deserialize, Deserializer};

pub const REPLACEMENTS: &str = "replacements";

/// Timestamp fields rewritten to canonical RFC 3339 in search results
pub const TIMESTAMP_FIELDS: &[&str] = &["startDate", "endDate", "createdAt", "updatedAt"];

/// Body of `POST /search_replacements`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub profession_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub establishment_ids: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub specialty_ids: Vec<String>,
}

/// An explicit `null` list means no filter, same as an absent one
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
