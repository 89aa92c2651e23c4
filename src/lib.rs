//! solace library
//!
//! Answers natural-language emotional queries with ranked excerpts from
//! scripture verses, supplications and narrated sayings.
//!
//! # Modules
//!
//! - `core`: Categories, content records, query validation, data paths
//! - `search`: Vector collections, fusion, similarity, result assembly
//! - `store`: Relational store for full content records

pub mod config;
pub mod core;
pub mod error;
pub mod search;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::Settings;
pub use core::category::Category;
pub use core::item::{ContentItem, ImportRecord, ItemDetails, NewItem};
pub use core::query::GuidanceQuery;
pub use error::{EmbeddingError, GuidanceError, Result};
pub use search::{GuidanceEngine, GuidanceResponse, GuidanceResult, SearchHit, SearchOptions};
pub use store::{ContentStore, SqliteStore};
