//! Import command - load JSON Lines records into the store and index them
//!
//! Each line is one record (see `ImportRecord`). Records are written to the
//! store in transactions of `batch_size`, and each batch's translations are
//! embedded with a single provider call. Snapshots are written once at the end.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use walkdir::WalkDir;

use solace::{Category, GuidanceEngine, ImportRecord, NewItem, Settings, SqliteStore};

/// Import statistics
#[derive(Debug, Default)]
struct ImportStats {
    files: usize,
    imported: usize,
    skipped: usize,
    removed: usize,
}

/// Run import command
pub fn run(
    settings: &Settings,
    category: &str,
    path: &Path,
    replace: bool,
    json: bool,
) -> Result<()> {
    let category: Category = category.parse()?;
    settings.validate()?;

    let files = collect_files(path)?;
    if files.is_empty() {
        bail!("No .jsonl files found at {}", path.display());
    }

    let paths = settings.paths();
    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("Failed to create {}", paths.root.display()))?;
    let store = Arc::new(SqliteStore::open(&paths.database)?);
    let engine = GuidanceEngine::open_with_store(settings, store.clone())?;

    let start = Instant::now();
    let mut stats = ImportStats {
        files: files.len(),
        ..ImportStats::default()
    };

    if replace {
        stats.removed = store.clear(category)?;
        engine.rebuild(category, &[], &[])?;
        info!(collection = category.name(), removed = stats.removed, "cleared category");
    }

    let outcome = import_files(
        &engine,
        &store,
        category,
        &files,
        settings.import_batch_size,
        &mut stats,
    );

    // Keep whatever was indexed, even if a later batch failed
    engine.checkpoint().context("Failed to write vector snapshots")?;
    outcome?;

    store.set_meta("last_import", &chrono::Utc::now().timestamp().to_string())?;
    let duration_ms = start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "category": category,
                "files": stats.files,
                "imported": stats.imported,
                "skipped": stats.skipped,
                "removed": stats.removed,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!(
            "{} Imported {} {} records in {:.2}s",
            "✓".green().bold(),
            stats.imported.to_string().cyan(),
            category.label(),
            duration_ms as f64 / 1000.0
        );
        if stats.removed > 0 {
            println!("  {} {} existing records replaced", "→".dimmed(), stats.removed);
        }
        if stats.skipped > 0 {
            println!("  {} {} lines skipped (invalid)", "✗".red(), stats.skipped);
        }
        println!(
            "  {} Index saved to: {}",
            "→".dimmed(),
            paths.vectors.display()
        );
    }

    Ok(())
}

fn import_files(
    engine: &GuidanceEngine,
    store: &SqliteStore,
    category: Category,
    files: &[PathBuf],
    batch_size: usize,
    stats: &mut ImportStats,
) -> Result<()> {
    let mut batch: Vec<NewItem> = Vec::with_capacity(batch_size);

    for file in files {
        let reader = BufReader::new(
            File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
        );

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str::<ImportRecord>(&line)
                .map_err(anyhow::Error::from)
                .and_then(|r| r.into_item(category).map_err(anyhow::Error::from));

            match record {
                Ok(item) => batch.push(item),
                Err(e) => {
                    warn!(
                        file = %file.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping record"
                    );
                    stats.skipped += 1;
                    continue;
                }
            }

            if batch.len() >= batch_size {
                stats.imported += flush(engine, store, category, &mut batch)?;
            }
        }
    }

    stats.imported += flush(engine, store, category, &mut batch)?;
    Ok(())
}

/// Write one batch to the store and index it; the store insert is rolled
/// back when embedding fails
fn flush(
    engine: &GuidanceEngine,
    store: &SqliteStore,
    category: Category,
    batch: &mut Vec<NewItem>,
) -> Result<usize> {
    if batch.is_empty() {
        return Ok(0);
    }

    let texts: Vec<&str> = batch.iter().map(|item| item.translation.as_str()).collect();
    store
        .insert_items_then(&batch[..], |ids| {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            engine.add_texts(category, &texts, &ids)
        })
        .context("Failed to import batch")?;

    let count = batch.len();
    batch.clear();
    info!(collection = category.name(), batch = count, "indexed batch");
    Ok(count)
}

/// A single file, or every `.jsonl` file under a directory (sorted)
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Path not found: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|e| e == "jsonl").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}
