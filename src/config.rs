//! Runtime settings.
//!
//! Values come from CLI flags, which fall back to `SOLACE_*` environment
//! variables and then to the defaults below.

use std::path::PathBuf;

use crate::core::paths::DataPaths;
use crate::error::{GuidanceError, Result};

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_PER_CATEGORY_K: usize = 2;
pub const DEFAULT_GLOBAL_MAX: usize = 5;
pub const DEFAULT_IMPORT_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub embedding_dimension: usize,
    pub per_category_k: usize,
    pub global_max: usize,
    pub import_batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            embedding_dimension: DEFAULT_EMBEDDING_DIM,
            per_category_k: DEFAULT_PER_CATEGORY_K,
            global_max: DEFAULT_GLOBAL_MAX,
            import_batch_size: DEFAULT_IMPORT_BATCH,
        }
    }
}

impl Settings {
    pub fn paths(&self) -> DataPaths {
        DataPaths::from_root(self.data_dir.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dimension == 0 || self.embedding_dimension % 2 != 0 {
            return Err(GuidanceError::validation(format!(
                "embedding dimension must be a positive even number, got {}",
                self.embedding_dimension
            )));
        }
        if self.per_category_k == 0 {
            return Err(GuidanceError::validation("per-category fan-out must be at least 1"));
        }
        if self.global_max == 0 {
            return Err(GuidanceError::validation("result cap must be at least 1"));
        }
        if self.import_batch_size == 0 {
            return Err(GuidanceError::validation("import batch size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.per_category_k, 2);
        assert_eq!(settings.global_max, 5);
    }

    #[test]
    fn test_rejects_odd_dimension() {
        let settings = Settings {
            embedding_dimension: 383,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_cap() {
        let settings = Settings {
            global_max: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
