//! Guidance command - ranked excerpts for an emotional query

use anyhow::{Context, Result};
use colored::Colorize;

use solace::{GuidanceEngine, GuidanceResult, Settings};

/// Run guidance command
pub fn run(settings: &Settings, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let engine = GuidanceEngine::open(settings).context("Failed to open guidance engine")?;

    if engine.registry().total_entries() == 0 && !json {
        println!(
            "{} Index is empty. Run {} first.",
            "!".yellow().bold(),
            "solace import".cyan()
        );
    }

    let response = engine.respond(query, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("{} No guidance found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        response.total_results,
        response.query.cyan()
    );
    println!();

    for (i, result) in response.results.iter().enumerate() {
        print_result(i + 1, result);
    }

    Ok(())
}

fn print_result(rank: usize, result: &GuidanceResult) {
    let score_str = format!("{:.2}", result.similarity_score);
    let score_colored = if result.similarity_score > 0.8 {
        score_str.green()
    } else if result.similarity_score > 0.6 {
        score_str.yellow()
    } else {
        score_str.dimmed()
    };

    println!(
        "{}. [{}] {} {}",
        rank.to_string().bold(),
        score_colored,
        result.label.bold(),
        result.citation.cyan()
    );
    println!("   {}", result.original_text);
    println!("   {}", truncate(&result.translation, 240).dimmed());
    println!();
}

/// Char-aware truncation for display
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
