//! Test doubles shared by unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::category::Category;
use crate::core::item::ContentItem;
use crate::error::{EmbeddingError, Result};
use crate::search::embedding::EmbeddingProvider;
use crate::store::ContentStore;

/// Encoder with hand-picked vectors; unknown texts map to the zero vector
pub struct KeyedEncoder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    calls: AtomicUsize,
}

impl KeyedEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `encode` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for KeyedEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Unavailable("encoder offline".into()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(*t)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimension])
            })
            .collect())
    }
}

/// Content store backed by a map
#[derive(Default)]
pub struct MemoryStore {
    items: HashMap<(Category, i64), ContentItem>,
}

impl MemoryStore {
    pub fn with(mut self, item: ContentItem) -> Self {
        self.items.insert((item.category(), item.id), item);
        self
    }
}

impl ContentStore for MemoryStore {
    fn fetch_item(&self, category: Category, id: i64) -> Result<Option<ContentItem>> {
        Ok(self.items.get(&(category, id)).cloned())
    }
}
