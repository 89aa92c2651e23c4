//! Exact nearest-neighbor search over one category's embeddings
//!
//! Vectors and ids live behind a single `RwLock`, so an insert publishes both
//! halves together and readers never observe a length mismatch. Encoding and
//! disk I/O both happen outside the lock.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

use super::embedding::{squared_l2, EmbeddingProvider};
use super::snapshot::{self, Snapshot};
use crate::core::category::Category;
use crate::error::{EmbeddingError, GuidanceError, Result};

/// One k-NN result within a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

pub struct VectorCollection {
    category: Category,
    dimension: usize,
    state: RwLock<Snapshot>,
    /// Set by every mutation, cleared by a successful save
    dirty: AtomicBool,
    /// Serializes saves so two checkpoints never share a temp file
    persist: Mutex<()>,
}

impl VectorCollection {
    pub fn new(category: Category, dimension: usize) -> Self {
        Self::from_snapshot(
            category,
            Snapshot {
                dimension,
                ..Snapshot::default()
            },
        )
    }

    fn from_snapshot(category: Category, snapshot: Snapshot) -> Self {
        Self {
            category,
            dimension: snapshot.dimension,
            state: RwLock::new(snapshot),
            dirty: AtomicBool::new(false),
            persist: Mutex::new(()),
        }
    }

    /// Restore from `dir`, falling back to an empty collection
    pub fn load(category: Category, dimension: usize, dir: &Path) -> Self {
        match snapshot::read(dir, category.name(), dimension) {
            Ok(Some(snapshot)) => {
                info!(
                    collection = category.name(),
                    entries = snapshot.len(),
                    "loaded vector snapshot"
                );
                Self::from_snapshot(category, snapshot)
            }
            Ok(None) => {
                info!(collection = category.name(), "no snapshot found, starting empty");
                Self::new(category, dimension)
            }
            Err(e) => {
                warn!(
                    collection = category.name(),
                    error = %e,
                    "could not load vector snapshot, starting empty"
                );
                Self::new(category, dimension)
            }
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &'static str {
        self.category.name()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Embed `texts` with one provider call and append them under `ids`
    ///
    /// Nothing is appended unless the whole batch encodes successfully.
    pub fn insert(
        &self,
        provider: &dyn EmbeddingProvider,
        texts: &[&str],
        ids: &[String],
    ) -> Result<()> {
        if texts.len() != ids.len() {
            return Err(GuidanceError::validation(format!(
                "{} texts but {} ids",
                texts.len(),
                ids.len()
            )));
        }
        if texts.is_empty() {
            return Ok(());
        }

        let vectors = provider.encode(texts)?;
        self.insert_vectors(vectors, ids)
    }

    /// Append pre-computed vectors
    pub fn insert_vectors(&self, vectors: Vec<Vec<f32>>, ids: &[String]) -> Result<()> {
        let flat = self.flatten(vectors, ids.len())?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();
        state.vectors.extend_from_slice(&flat);
        state.ids.extend_from_slice(ids);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Replace the whole contents in one step (used by rebuilds)
    pub fn replace(
        &self,
        provider: &dyn EmbeddingProvider,
        texts: &[&str],
        ids: &[String],
    ) -> Result<()> {
        if texts.len() != ids.len() {
            return Err(GuidanceError::validation(format!(
                "{} texts but {} ids",
                texts.len(),
                ids.len()
            )));
        }

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            provider.encode(texts)?
        };
        let flat = self.flatten(vectors, ids.len())?;

        let mut state = self.state.write();
        state.vectors = flat;
        state.ids = ids.to_vec();
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Check provider output against the batch and flatten it row-major
    fn flatten(&self, vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<f32>> {
        if vectors.len() != expected {
            return Err(EmbeddingError::Malformed {
                expected: format!("{} vectors", expected),
                actual: format!("{} vectors", vectors.len()),
            }
            .into());
        }

        let mut flat = Vec::with_capacity(expected * self.dimension);
        for v in vectors {
            if v.len() != self.dimension {
                return Err(EmbeddingError::Malformed {
                    expected: format!("dimension {}", self.dimension),
                    actual: format!("dimension {}", v.len()),
                }
                .into());
            }
            flat.extend(v);
        }
        Ok(flat)
    }

    /// The `k` nearest entries, ascending by squared L2 distance
    ///
    /// `k` is clamped to the collection size; equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(GuidanceError::validation(format!(
                "query vector has dimension {}, collection '{}' expects {}",
                query.len(),
                self.name(),
                self.dimension
            )));
        }

        let state = self.state.read();
        let k = k.min(state.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = state
            .vectors
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(query, row))
            .enumerate()
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, |a, b| {
                a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
            });
            scored.truncate(k);
        }
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| Neighbor {
                id: state.ids[pos].clone(),
                distance,
            })
            .collect())
    }

    /// Consistent copy of the current contents
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().clone()
    }

    /// Ordered (id, vector) pairs
    pub fn entries(&self) -> Vec<(String, Vec<f32>)> {
        let state = self.state.read();
        state
            .ids
            .iter()
            .cloned()
            .zip(state.vectors.chunks_exact(self.dimension).map(<[f32]>::to_vec))
            .collect()
    }

    /// Write the current contents to `dir`
    ///
    /// Readers and writers are only blocked while the contents are copied.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let _guard = self.persist.lock();

        self.dirty.store(false, Ordering::Release);
        let snapshot = self.snapshot();

        snapshot::write(dir, self.name(), &snapshot).map_err(|source| {
            self.dirty.store(true, Ordering::Release);
            error!(collection = self.name(), error = %source, "failed to save vector snapshot");
            GuidanceError::Persistence {
                collection: self.name().to_string(),
                source,
            }
        })?;

        info!(collection = self.name(), entries = snapshot.len(), "saved vector snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::KeyedEncoder;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// 1-d collection whose entries sit at the given squared distances from 0
    fn at_distances(distances: &[f32]) -> VectorCollection {
        let collection = VectorCollection::new(Category::Scripture, 1);
        let vectors = distances.iter().map(|d| vec![d.sqrt()]).collect();
        let ids: Vec<String> = (0..distances.len()).map(|i| i.to_string()).collect();
        collection.insert_vectors(vectors, &ids).unwrap();
        collection
    }

    #[test]
    fn test_search_sorted_and_clamped() {
        let collection = at_distances(&[1.9, 0.1, 0.5]);

        let hits = collection.search(&[0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
        let found: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(found, vec!["1", "2", "0"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let top = collection.search(&[0.0], 2).unwrap();
        assert_eq!(top.len(), 2);
        assert!((top[0].distance - 0.1).abs() < 1e-5);
        assert!((top[1].distance - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_search_empty_collection() {
        let collection = VectorCollection::new(Category::Supplication, 3);
        assert!(collection.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_k_zero() {
        let collection = at_distances(&[0.3]);
        assert!(collection.search(&[0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let collection = at_distances(&[0.4, 0.4, 0.4]);
        let hits = collection.search(&[0.0], 2).unwrap();
        assert_eq!(hits[0].id, "0");
        assert_eq!(hits[1].id, "1");
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let collection = at_distances(&[0.3]);
        let err = collection.search(&[0.0, 1.0], 1).unwrap_err();
        assert!(matches!(err, GuidanceError::Validation(_)));
    }

    #[test]
    fn test_insert_mismatched_lengths() {
        let encoder = KeyedEncoder::new(2);
        let collection = VectorCollection::new(Category::Scripture, 2);

        let err = collection
            .insert(&encoder, &["patience"], &ids(&["1", "2"]))
            .unwrap_err();
        assert!(matches!(err, GuidanceError::Validation(_)));
        assert_eq!(encoder.calls(), 0);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_insert_empty_batch_is_noop() {
        let encoder = KeyedEncoder::new(2);
        let collection = VectorCollection::new(Category::Scripture, 2);

        collection.insert(&encoder, &[], &[]).unwrap();
        assert!(collection.is_empty());
        assert!(!collection.is_dirty());
        assert_eq!(encoder.calls(), 0);
    }

    #[test]
    fn test_insert_encodes_once_per_batch() {
        let encoder = KeyedEncoder::new(2)
            .with("patience", vec![1.0, 0.0])
            .with("gratitude", vec![0.0, 1.0]);
        let collection = VectorCollection::new(Category::Scripture, 2);

        collection
            .insert(&encoder, &["patience", "gratitude"], &ids(&["10", "11"]))
            .unwrap();

        assert_eq!(encoder.calls(), 1);
        assert_eq!(collection.len(), 2);
        assert!(collection.is_dirty());
        assert_eq!(
            collection.entries(),
            vec![
                ("10".to_string(), vec![1.0, 0.0]),
                ("11".to_string(), vec![0.0, 1.0]),
            ]
        );
    }

    #[test]
    fn test_failed_encoding_leaves_collection_untouched() {
        let encoder = KeyedEncoder::new(2).failing();
        let collection = VectorCollection::new(Category::Scripture, 2);

        let err = collection
            .insert(&encoder, &["patience"], &ids(&["1"]))
            .unwrap_err();
        assert!(matches!(err, GuidanceError::Embedding(_)));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_malformed_vectors_rejected() {
        let collection = VectorCollection::new(Category::Scripture, 2);
        let err = collection
            .insert_vectors(vec![vec![1.0, 0.0, 0.0]], &ids(&["1"]))
            .unwrap_err();
        assert!(matches!(
            err,
            GuidanceError::Embedding(EmbeddingError::Malformed { .. })
        ));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_replace_swaps_contents() {
        let encoder = KeyedEncoder::new(2).with("hope", vec![0.5, 0.5]);
        let collection = VectorCollection::new(Category::Scripture, 2);
        collection
            .insert_vectors(vec![vec![0.0, 0.0]; 2], &ids(&["a", "b"]))
            .unwrap();

        collection.replace(&encoder, &["hope"], &ids(&["z"])).unwrap();
        assert_eq!(collection.entries(), vec![("z".to_string(), vec![0.5, 0.5])]);

        collection.replace(&encoder, &[], &[]).unwrap();
        assert!(collection.is_empty());
        assert!(collection.is_dirty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let collection = VectorCollection::new(Category::NarratedSaying, 3);
        collection
            .insert_vectors(
                vec![vec![0.1, 0.2, 0.3], vec![-1.0, 0.0, 2.5]],
                &ids(&["42", "7"]),
            )
            .unwrap();

        collection.save(dir.path()).unwrap();
        assert!(!collection.is_dirty());

        let restored = VectorCollection::load(Category::NarratedSaying, 3, dir.path());
        assert_eq!(restored.entries(), collection.entries());
        assert!(!restored.is_dirty());
    }

    #[test]
    fn test_load_corrupt_snapshot_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scripture.index"), b"garbage").unwrap();
        std::fs::write(dir.path().join("scripture_ids.json"), b"[\"1\"]").unwrap();

        let collection = VectorCollection::load(Category::Scripture, 4, dir.path());
        assert!(collection.is_empty());
        assert_eq!(collection.dimension(), 4);
    }

    #[test]
    fn test_load_with_one_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let collection = at_distances(&[0.1]);
        collection.save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join("scripture_ids.json")).unwrap();

        assert!(VectorCollection::load(Category::Scripture, 1, dir.path()).is_empty());
    }

    #[test]
    fn test_load_rejects_ids_from_a_newer_save() {
        let dir = tempfile::tempdir().unwrap();
        let old = VectorCollection::new(Category::Scripture, 1);
        old.insert_vectors(vec![vec![0.0], vec![9.0]], &ids(&["1", "2"]))
            .unwrap();
        old.save(dir.path()).unwrap();

        // Same size, new ids: only the id list reached disk before a crash
        let newer_dir = tempfile::tempdir().unwrap();
        let newer = VectorCollection::new(Category::Scripture, 1);
        newer
            .insert_vectors(vec![vec![5.0], vec![1.0]], &ids(&["3", "4"]))
            .unwrap();
        newer.save(newer_dir.path()).unwrap();
        std::fs::copy(
            newer_dir.path().join("scripture_ids.json"),
            dir.path().join("scripture_ids.json"),
        )
        .unwrap();

        assert!(VectorCollection::load(Category::Scripture, 1, dir.path()).is_empty());
    }

    #[test]
    fn test_failed_save_keeps_memory_and_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let collection = at_distances(&[0.1]);
        let err = collection.save(&blocker).unwrap_err();
        assert!(matches!(err, GuidanceError::Persistence { .. }));
        assert!(collection.is_dirty());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_readers_never_see_partial_insert() {
        let collection = VectorCollection::new(Category::Scripture, 4);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for batch in 0..50 {
                    let ids: Vec<String> = (0..8).map(|i| format!("{}-{}", batch, i)).collect();
                    let vectors = vec![vec![batch as f32; 4]; 8];
                    collection.insert_vectors(vectors, &ids).unwrap();
                }
            });

            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let snapshot = collection.snapshot();
                        assert_eq!(snapshot.vectors.len(), snapshot.ids.len() * 4);
                        assert_eq!(snapshot.len() % 8, 0);

                        let hits = collection.search(&[0.0; 4], 3).unwrap();
                        assert!(hits.len() <= 3);
                    }
                });
            }
        });

        assert_eq!(collection.len(), 400);
    }
}
