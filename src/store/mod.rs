//! Relational store holding full content records
//!
//! The retrieval core only needs [`ContentStore::fetch_item`]; writes are
//! issued by the import and rebuild commands through [`SqliteStore`].

pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};

use crate::core::category::Category;
use crate::core::item::ContentItem;
use crate::error::Result;

pub trait ContentStore: Send + Sync {
    /// `Ok(None)` when no record exists under (category, id)
    fn fetch_item(&self, category: Category, id: i64) -> Result<Option<ContentItem>>;

    /// Cheap liveness check used by health reports
    fn ping(&self) -> Result<()> {
        Ok(())
    }
}
