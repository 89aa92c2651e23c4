//! Cross-category search fusion
//!
//! One query vector is searched against every collection and the per-category
//! hits are merged into one list ordered by distance. Equal distances resolve
//! by category registration order, then by rank within the category: hits are
//! concatenated in that order and the sort is stable.

use serde::Serialize;

use super::embedding::EmbeddingProvider;
use super::registry::CollectionRegistry;
use crate::core::category::Category;
use crate::error::{EmbeddingError, Result};

/// One fused hit. Lives for a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub category: Category,
    pub id: String,
    pub distance: f32,
}

/// Encode `query` once and fuse results across all collections
pub fn search_all(
    provider: &dyn EmbeddingProvider,
    registry: &CollectionRegistry,
    query: &str,
    per_category_k: usize,
    global_max: usize,
) -> Result<Vec<SearchHit>> {
    let mut encoded = provider.encode(&[query])?;
    if encoded.len() != 1 {
        return Err(EmbeddingError::Malformed {
            expected: "1 vector".to_string(),
            actual: format!("{} vectors", encoded.len()),
        }
        .into());
    }
    let query_vector = encoded.swap_remove(0);

    fuse(registry, &query_vector, per_category_k, global_max)
}

/// Fuse results for an already-encoded query
pub fn fuse(
    registry: &CollectionRegistry,
    query_vector: &[f32],
    per_category_k: usize,
    global_max: usize,
) -> Result<Vec<SearchHit>> {
    let mut hits = Vec::new();

    for collection in registry.iter() {
        let category = collection.category();
        hits.extend(
            collection
                .search(query_vector, per_category_k)?
                .into_iter()
                .map(|n| SearchHit {
                    category,
                    id: n.id,
                    distance: n.distance,
                }),
        );
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(global_max);
    Ok(hits)
}
