//! Multi-collection semantic retrieval
//!
//! One exact (brute-force) vector collection per content category, fused into
//! a single ranking and rehydrated from the content store.

pub mod assembler;
pub mod collection;
pub mod embedding;
pub mod engine;
pub mod fusion;
pub mod registry;
pub mod similarity;
pub mod snapshot;

pub use assembler::{GuidanceResponse, GuidanceResult};
pub use collection::{Neighbor, VectorCollection};
pub use embedding::{EmbeddingProvider, HarmonicEncoder};
pub use engine::{GuidanceEngine, HealthReport, SearchOptions};
pub use fusion::SearchHit;
pub use registry::{CollectionRegistry, CollectionStats};
