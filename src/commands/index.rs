//! Index command - show or rebuild the per-category vector snapshots

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use solace::core::paths::{ids_file, index_file};
use solace::{Category, GuidanceEngine, Settings, SqliteStore};

/// One row of `index --status`
#[derive(Debug, Serialize)]
struct CollectionStatus {
    category: Category,
    indexed: usize,
    stored: usize,
    unsaved_changes: bool,
    snapshot_bytes: u64,
}

/// Run index command
pub fn run(
    settings: &Settings,
    status_only: bool,
    rebuild: bool,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let category = category.map(str::parse::<Category>).transpose()?;

    let paths = settings.paths();
    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("Failed to create {}", paths.root.display()))?;
    let store = Arc::new(SqliteStore::open(&paths.database)?);
    let engine = GuidanceEngine::open_with_store(settings, store.clone())?;

    if rebuild && !status_only {
        let categories = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };
        rebuild_collections(&engine, &store, &categories, json)?;
    }

    show_status(&engine, &store, &paths.vectors, json)
}

/// Re-embed every stored record of the given categories
fn rebuild_collections(
    engine: &GuidanceEngine,
    store: &SqliteStore,
    categories: &[Category],
    json: bool,
) -> Result<()> {
    let start = Instant::now();

    if !json {
        println!("{} Rebuilding vector index...", "→".dimmed());
    }

    let mut total = 0;
    for &category in categories {
        let items = store.list_items(category)?;
        let texts: Vec<&str> = items.iter().map(|i| i.translation.as_str()).collect();
        let ids: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();

        engine
            .rebuild(category, &texts, &ids)
            .with_context(|| format!("Failed to rebuild {}", category.name()))?;
        total += items.len();

        if !json {
            println!(
                "  {} {:<10} {} entries",
                "✓".green(),
                category.label(),
                items.len().to_string().cyan()
            );
        }
    }

    engine.checkpoint().context("Failed to write vector snapshots")?;
    info!(
        entries = total,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "index rebuilt"
    );

    if !json {
        println!(
            "{} Rebuilt {} entries in {:.2}s",
            "✓".green().bold(),
            total.to_string().cyan(),
            start.elapsed().as_secs_f64()
        );
        println!();
    }
    Ok(())
}

/// Show index status
fn show_status(
    engine: &GuidanceEngine,
    store: &SqliteStore,
    vectors_dir: &Path,
    json: bool,
) -> Result<()> {
    let store_stats = store.stats()?;
    let rows: Vec<CollectionStatus> = engine
        .stats()
        .into_iter()
        .map(|stats| {
            let stored = store_stats
                .counts
                .iter()
                .find(|(c, _)| *c == stats.category)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            CollectionStatus {
                category: stats.category,
                indexed: stats.entries,
                stored,
                unsaved_changes: stats.dirty,
                snapshot_bytes: snapshot_size(vectors_dir, stats.category.name()),
            }
        })
        .collect();

    let last_import = store_stats.last_import.map(format_timestamp);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dimension": engine.registry().dimension(),
                "total_indexed": engine.registry().total_entries(),
                "last_import": last_import,
                "collections": rows,
            })
        );
        return Ok(());
    }

    println!("{}", "Index Status".bold());
    println!();
    for row in &rows {
        let marker = if row.indexed == row.stored {
            "✓".green()
        } else {
            "!".yellow()
        };
        println!(
            "  {} {:<10} {} indexed / {} stored  ({:.2} KB)",
            marker,
            row.category.label(),
            row.indexed.to_string().cyan(),
            row.stored,
            row.snapshot_bytes as f64 / 1024.0
        );
    }
    println!();
    println!(
        "  {} Dimension: {}",
        "→".dimmed(),
        engine.registry().dimension()
    );
    if let Some(ts) = last_import {
        println!("  {} Last import: {}", "→".dimmed(), ts);
    }
    if rows.iter().any(|r| r.indexed != r.stored) {
        println!(
            "  {} Index and store disagree. Run {} to resync.",
            "!".yellow().bold(),
            "solace index --rebuild".cyan()
        );
    }

    Ok(())
}

/// Combined size of a collection's snapshot files; 0 when absent
fn snapshot_size(dir: &Path, name: &str) -> u64 {
    [index_file(dir, name), ids_file(dir, name)]
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
