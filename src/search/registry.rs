//! Fixed set of per-category vector collections

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::collection::VectorCollection;
use crate::core::category::Category;
use crate::error::{GuidanceError, Result};

/// Per-collection summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub category: Category,
    pub entries: usize,
    pub dirty: bool,
}

/// Owns one collection per [`Category`], in registration order
pub struct CollectionRegistry {
    dir: Option<PathBuf>,
    dimension: usize,
    collections: Vec<Arc<VectorCollection>>,
}

impl CollectionRegistry {
    /// Load every collection from `dir`; missing or corrupt snapshots start empty
    pub fn open(dir: &Path, dimension: usize) -> Self {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "cannot create vector directory");
        }

        let collections = Category::ALL
            .iter()
            .map(|&c| Arc::new(VectorCollection::load(c, dimension, dir)))
            .collect();

        Self {
            dir: Some(dir.to_path_buf()),
            dimension,
            collections,
        }
    }

    /// Empty collections with no backing directory; checkpoints are no-ops
    pub fn in_memory(dimension: usize) -> Self {
        Self {
            dir: None,
            dimension,
            collections: Category::ALL
                .iter()
                .map(|&c| Arc::new(VectorCollection::new(c, dimension)))
                .collect(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn get(&self, category: Category) -> &Arc<VectorCollection> {
        &self.collections[category.rank()]
    }

    /// Collections in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VectorCollection>> {
        self.collections.iter()
    }

    pub fn total_entries(&self) -> usize {
        self.collections.iter().map(|c| c.len()).sum()
    }

    pub fn stats(&self) -> Vec<CollectionStats> {
        self.collections
            .iter()
            .map(|c| CollectionStats {
                category: c.category(),
                entries: c.len(),
                dirty: c.is_dirty(),
            })
            .collect()
    }

    /// Save every dirty collection
    ///
    /// All collections are attempted; the first failure is returned. Returns
    /// the categories that were written.
    pub fn checkpoint(&self) -> Result<Vec<Category>> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };

        let mut saved = Vec::new();
        let mut first_error: Option<GuidanceError> = None;

        for collection in self.collections.iter().filter(|c| c.is_dirty()) {
            match collection.save(dir) {
                Ok(()) => saved.push(collection.category()),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        if !saved.is_empty() {
            info!(collections = saved.len(), "checkpoint complete");
        }
        Ok(saved)
    }
}
