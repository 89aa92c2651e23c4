//! Turn ranked hits into citable results

use serde::Serialize;
use tracing::debug;

use super::fusion::SearchHit;
use super::similarity::{round_score, to_similarity};
use crate::core::category::Category;
use crate::error::Result;
use crate::store::ContentStore;

/// Final, externally visible result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceResult {
    pub category: Category,
    /// Display label of the category (Quran, Dua, Hadith)
    pub label: &'static str,
    pub original_text: String,
    pub translation: String,
    pub citation: String,
    /// Similarity in [0, 1], higher is more relevant
    pub similarity_score: f32,
}

/// Response envelope for one query
#[derive(Debug, Clone, Serialize)]
pub struct GuidanceResponse {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<GuidanceResult>,
}

impl GuidanceResponse {
    pub fn new(query: impl Into<String>, results: Vec<GuidanceResult>) -> Self {
        Self {
            query: query.into(),
            total_results: results.len(),
            results,
        }
    }
}

/// Fetch the record behind each hit, keeping rank order
///
/// Hits whose record no longer exists (stale index) are dropped; store
/// failures abort the whole query.
pub fn assemble(store: &dyn ContentStore, hits: &[SearchHit]) -> Result<Vec<GuidanceResult>> {
    let mut results = Vec::with_capacity(hits.len());

    for hit in hits {
        let Ok(id) = hit.id.parse::<i64>() else {
            debug!(category = %hit.category, id = %hit.id, "dropping hit with non-numeric id");
            continue;
        };

        let Some(item) = store.fetch_item(hit.category, id)? else {
            debug!(category = %hit.category, id, "dropping hit without backing record");
            continue;
        };

        results.push(GuidanceResult {
            category: hit.category,
            label: hit.category.label(),
            original_text: item.original_text,
            translation: item.translation,
            citation: item.citation,
            similarity_score: round_score(to_similarity(hit.distance)),
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::{ContentItem, ItemDetails};
    use crate::test_support::MemoryStore;

    fn hit(category: Category, id: &str, distance: f32) -> SearchHit {
        SearchHit {
            category,
            id: id.to_string(),
            distance,
        }
    }

    fn dua(id: i64, citation: &str) -> ContentItem {
        ContentItem {
            id,
            original_text: "...".into(),
            translation: format!("translation of {}", citation),
            citation: citation.into(),
            details: ItemDetails::Supplication {
                title: "t".into(),
            },
        }
    }

    #[test]
    fn test_preserves_rank_and_drops_missing() {
        let store = MemoryStore::default()
            .with(dua(1, "Dua A"))
            .with(dua(3, "Dua C"));

        let hits = vec![
            hit(Category::Supplication, "3", 0.1),
            hit(Category::Supplication, "2", 0.2),
            hit(Category::Supplication, "1", 0.5),
        ];

        let results = assemble(&store, &hits).unwrap();
        let citations: Vec<&str> = results.iter().map(|r| r.citation.as_str()).collect();
        assert_eq!(citations, vec!["Dua C", "Dua A"]);
        assert_eq!(results[0].similarity_score, 0.95);
        assert_eq!(results[1].similarity_score, 0.75);
        assert_eq!(results[0].label, "Dua");
    }

    #[test]
    fn test_category_is_part_of_key() {
        let store = MemoryStore::default().with(dua(1, "Dua A"));
        let hits = vec![hit(Category::Scripture, "1", 0.1)];
        assert!(assemble(&store, &hits).unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_id_is_dropped() {
        let store = MemoryStore::default().with(dua(1, "Dua A"));
        let hits = vec![
            hit(Category::Supplication, "abc", 0.0),
            hit(Category::Supplication, "1", 3.0),
        ];

        let results = assemble(&store, &hits).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity_score, 0.0);
    }

    #[test]
    fn test_empty_hits() {
        let store = MemoryStore::default();
        assert!(assemble(&store, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_response_envelope() {
        let response = GuidanceResponse::new("I feel sad", Vec::new());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_results"], 0);
        assert_eq!(json["query"], "I feel sad");
    }
}
