//! Guidance engine - ties the embedding provider, vector collections and
//! content store together
//!
//! The engine is built once at startup and shared (`Arc`) by whatever serves
//! queries; there is no global instance.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use super::assembler::{assemble, GuidanceResponse, GuidanceResult};
use super::embedding::{EmbeddingProvider, HarmonicEncoder};
use super::fusion::{search_all, SearchHit};
use super::registry::{CollectionRegistry, CollectionStats};
use crate::config::Settings;
use crate::core::category::Category;
use crate::core::query::GuidanceQuery;
use crate::error::{GuidanceError, Result};
use crate::store::{ContentStore, SqliteStore};

/// Fan-out and cap for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Hits requested from each collection
    pub per_category_k: usize,
    /// Maximum hits after fusion
    pub global_max: usize,
}

impl SearchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            per_category_k: settings.per_category_k,
            global_max: settings.global_max,
        }
    }
}

/// Health of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// "healthy" when every component is, otherwise "degraded"
    pub status: &'static str,
    pub database: ComponentStatus,
    pub vector_store: ComponentStatus,
    pub indexed_entries: usize,
}

pub struct GuidanceEngine {
    provider: Arc<dyn EmbeddingProvider>,
    registry: CollectionRegistry,
    store: Arc<dyn ContentStore>,
    options: SearchOptions,
}

impl GuidanceEngine {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        registry: CollectionRegistry,
        store: Arc<dyn ContentStore>,
        options: SearchOptions,
    ) -> Result<Self> {
        if provider.dimension() != registry.dimension() {
            return Err(GuidanceError::validation(format!(
                "provider dimension {} does not match collection dimension {}",
                provider.dimension(),
                registry.dimension()
            )));
        }
        if options.per_category_k == 0 || options.global_max == 0 {
            return Err(GuidanceError::validation(
                "per-category fan-out and result cap must be at least 1",
            ));
        }

        Ok(Self {
            provider,
            registry,
            store,
            options,
        })
    }

    /// Open the SQLite store and vector snapshots under the configured data dir
    pub fn open(settings: &Settings) -> Result<Self> {
        let paths = settings.paths();
        std::fs::create_dir_all(&paths.root).map_err(|source| GuidanceError::Persistence {
            collection: paths.root.display().to_string(),
            source,
        })?;
        let store = Arc::new(SqliteStore::open(&paths.database)?);
        Self::open_with_store(settings, store)
    }

    /// Same as [`open`](Self::open) with a caller-supplied store
    pub fn open_with_store(settings: &Settings, store: Arc<dyn ContentStore>) -> Result<Self> {
        settings.validate()?;

        let provider = Arc::new(HarmonicEncoder::new(settings.embedding_dimension)?);
        let registry =
            CollectionRegistry::open(&settings.paths().vectors, settings.embedding_dimension);

        Self::new(
            provider,
            registry,
            store,
            SearchOptions::from_settings(settings),
        )
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Ranked results for a query with the configured fan-out and cap
    pub fn get_guidance(&self, query: &str) -> Result<Vec<GuidanceResult>> {
        self.get_guidance_with(query, self.options)
    }

    pub fn get_guidance_with(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<GuidanceResult>> {
        let start = Instant::now();

        let hits = self.search(query, options)?;
        let results = assemble(self.store.as_ref(), &hits)?;

        info!(
            hits = hits.len(),
            results = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "guidance query processed"
        );
        Ok(results)
    }

    /// Validate raw user input, run the query and wrap the response
    pub fn respond(&self, raw_query: &str, limit: Option<usize>) -> Result<GuidanceResponse> {
        let query = GuidanceQuery::parse(raw_query)?;
        let mut options = self.options;
        if let Some(limit) = limit {
            if limit == 0 {
                return Err(GuidanceError::validation("limit must be at least 1"));
            }
            options.global_max = limit;
        }

        let results = self.get_guidance_with(query.as_str(), options).map_err(|e| {
            error!(error = %e, "failed to get guidance");
            e
        })?;
        Ok(GuidanceResponse::new(query.as_str(), results))
    }

    /// Fused hits without rehydration
    pub fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        search_all(
            self.provider.as_ref(),
            &self.registry,
            query,
            options.per_category_k,
            options.global_max,
        )
    }

    /// Embed and append a batch to one collection. Not persisted until
    /// [`checkpoint`](Self::checkpoint).
    pub fn add_texts(&self, category: Category, texts: &[&str], ids: &[String]) -> Result<()> {
        self.registry
            .get(category)
            .insert(self.provider.as_ref(), texts, ids)?;
        info!(collection = category.name(), added = texts.len(), "added texts");
        Ok(())
    }

    /// Replace a collection's contents with a fresh embedding of `texts`
    pub fn rebuild(&self, category: Category, texts: &[&str], ids: &[String]) -> Result<()> {
        self.registry
            .get(category)
            .replace(self.provider.as_ref(), texts, ids)?;
        info!(collection = category.name(), entries = ids.len(), "rebuilt collection");
        Ok(())
    }

    /// Persist every collection changed since the last checkpoint
    pub fn checkpoint(&self) -> Result<Vec<Category>> {
        self.registry.checkpoint()
    }

    pub fn stats(&self) -> Vec<CollectionStats> {
        self.registry.stats()
    }

    pub fn health(&self) -> HealthReport {
        let database = match self.store.ping() {
            Ok(()) => ComponentStatus::Healthy,
            Err(e) => {
                error!(error = %e, "database health check failed");
                ComponentStatus::Unhealthy
            }
        };

        let indexed_entries = self.registry.total_entries();
        let vector_store = if self.registry.dir().map_or(true, |d| d.is_dir()) {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        };

        let all_healthy =
            database == ComponentStatus::Healthy && vector_store == ComponentStatus::Healthy;
        let status = if all_healthy { "healthy" } else { "degraded" };

        HealthReport {
            status,
            database,
            vector_store,
            indexed_entries,
        }
    }
}
