use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::{ServiceError, ServiceResult};
use crate::models::replacement::{SearchRequest, REPLACEMENTS, TIMESTAMP_FIELDS};
use crate::models::{format_timestamp, normalize_timestamp_field};
use crate::store::query::parse_timestamp;
use crate::store::{CollectionPath, Document, DocumentStore, Query};

/// Search over open replacement postings
pub struct ReplacementService {
    store: Arc<dyn DocumentStore>,
}

impl ReplacementService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Builds the store-side query: profession is mandatory, establishments and
    /// the start-date range narrow it when present
    pub fn build_query(request: &SearchRequest) -> ServiceResult<Query> {
        let profession_id = request
            .profession_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ServiceError::MissingFields(vec!["professionId"]))?;

        let mut query = Query::new().eq("professionId", profession_id);

        if !request.establishment_ids.is_empty() {
            let ids = request.establishment_ids.iter().cloned().map(Value::String).collect();
            query = query.within("establishmentId", ids);
        }

        // The date range only applies when both bounds are given
        if let (Some(start), Some(end)) = (non_blank(&request.start_date), non_blank(&request.end_date)) {
            let start = parse_timestamp(start)
                .ok_or_else(|| ServiceError::InvalidInput(format!("invalid startDate '{}'", start)))?;
            let end = parse_timestamp(end)
                .ok_or_else(|| ServiceError::InvalidInput(format!("invalid endDate '{}'", end)))?;
            debug!("Searching between {} and {}", start, end);
            query = query
                .gte("startDate", format_timestamp(start))
                .lte("startDate", format_timestamp(end));
        }

        Ok(query)
    }

    pub async fn search(&self, request: &SearchRequest) -> ServiceResult<Vec<Value>> {
        let query = Self::build_query(request)?;
        let collection = CollectionPath::root(REPLACEMENTS)?;
        let candidates = self.store.query(&collection, &query).await?;
        let candidate_count = candidates.len();

        let results: Vec<Value> = candidates
            .into_iter()
            .filter(|doc| matches_specialty(doc, &request.specialty_ids))
            .map(present)
            .collect();

        info!(
            "Replacement search for profession {:?}: {} candidates, {} results",
            request.profession_id,
            candidate_count,
            results.len()
        );
        Ok(results)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// In-process specialty filter; an empty filter accepts everything
fn matches_specialty(doc: &Document, specialty_ids: &[String]) -> bool {
    if specialty_ids.is_empty() {
        return true;
    }
    doc.get_str("specialtyId")
        .map(|id| specialty_ids.iter().any(|s| s == id))
        .unwrap_or(false)
}

/// Result shape: document body plus `id`, timestamps canonical, audit dates null when absent
fn present(doc: Document) -> Value {
    let mut doc = doc;
    for field in TIMESTAMP_FIELDS {
        normalize_timestamp_field(&mut doc.data, field);
    }
    for field in ["createdAt", "updatedAt"] {
        doc.data.entry(field).or_insert(Value::Null);
    }
    doc.into_json_with_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seeded() -> ReplacementService {
        let store = MemoryStore::new();
        let postings = [
            ("r1", "nurse", "e1", "cardio", "2025-03-01T08:00:00Z"),
            ("r2", "nurse", "e2", "pediatrics", "2025-03-15T08:00:00Z"),
            ("r3", "nurse", "e3", "cardio", "2025-04-01T08:00:00Z"),
            ("r4", "midwife", "e1", "cardio", "2025-03-02T08:00:00Z"),
        ];
        for (id, profession, establishment, specialty, start) in postings {
            store
                .insert(
                    REPLACEMENTS,
                    id,
                    json!({
                        "professionId": profession,
                        "establishmentId": establishment,
                        "specialtyId": specialty,
                        "startDate": start,
                        "endDate": start,
                        "status": "open",
                    }),
                )
                .await
                .unwrap();
        }
        ReplacementService::new(Arc::new(store))
    }

    fn request(profession: &str) -> SearchRequest {
        SearchRequest {
            profession_id: Some(profession.into()),
            ..Default::default()
        }
    }

    fn ids(results: &[Value]) -> Vec<&str> {
        results.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn profession_filter_is_exact() {
        let service = seeded().await;
        let results = service.search(&request("nurse")).await.unwrap();
        assert_eq!(ids(&results), vec!["r1", "r2", "r3"]);
        assert!(results.iter().all(|r| r["professionId"] == "nurse"));
    }

    #[tokio::test]
    async fn profession_is_required() {
        let service = seeded().await;
        let err = service.search(&SearchRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingFields(_)));
        let err = service.search(&request("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingFields(_)));
    }

    #[tokio::test]
    async fn establishment_filter_restricts_results() {
        let service = seeded().await;
        let mut req = request("nurse");
        req.establishment_ids = vec!["e1".into(), "e3".into()];
        let results = service.search(&req).await.unwrap();
        assert_eq!(ids(&results), vec!["r1", "r3"]);
        assert!(results
            .iter()
            .all(|r| req.establishment_ids.iter().any(|e| r["establishmentId"] == e.as_str())));
    }

    #[tokio::test]
    async fn date_range_is_inclusive_and_needs_both_bounds() {
        let service = seeded().await;
        let mut req = request("nurse");
        req.start_date = Some("2025-03-01T08:00:00Z".into());
        req.end_date = Some("2025-03-15T08:00:00.000Z".into());
        assert_eq!(ids(&service.search(&req).await.unwrap()), vec!["r1", "r2"]);

        req.end_date = None;
        assert_eq!(service.search(&req).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_dates_are_rejected() {
        let service = seeded().await;
        let mut req = request("nurse");
        req.start_date = Some("yesterday".into());
        req.end_date = Some("2025-03-15T08:00:00Z".into());
        assert!(matches!(service.search(&req).await, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn specialty_post_filter() {
        let service = seeded().await;
        let mut req = request("nurse");
        req.specialty_ids = vec!["cardio".into()];
        assert_eq!(ids(&service.search(&req).await.unwrap()), vec!["r1", "r3"]);
    }

    #[tokio::test]
    async fn results_carry_canonical_timestamps() {
        let service = seeded().await;
        let results = service.search(&request("midwife")).await.unwrap();
        assert_eq!(results[0]["startDate"], "2025-03-02T08:00:00.000Z");
        assert_eq!(results[0]["createdAt"], Value::Null);
    }
}
