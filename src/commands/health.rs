use anyhow::Result;
use colored::*;

use solace::search::engine::{ComponentStatus, HealthReport};
use solace::{GuidanceEngine, Settings};

pub fn run(settings: &Settings, json: bool) -> Result<()> {
    let engine = GuidanceEngine::open(settings)?;
    let report = engine.health();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.status != "healthy" {
        std::process::exit(1);
    }

    Ok(())
}

fn icon(status: ComponentStatus) -> ColoredString {
    match status {
        ComponentStatus::Healthy => "✓".green(),
        ComponentStatus::Unhealthy => "✗".red(),
    }
}

fn print_report(report: &HealthReport) {
    let status = if report.status == "healthy" {
        report.status.green().bold()
    } else {
        report.status.yellow().bold()
    };

    println!("Status: {}", status);
    println!();
    println!("   {} {:<14}", icon(report.database), "database");
    println!("   {} {:<14}", icon(report.vector_store), "vector store");
    println!();
    println!("Indexed entries: {}", report.indexed_entries.to_string().cyan());
}
