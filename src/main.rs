mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solace::config::{
    Settings, DEFAULT_DATA_DIR, DEFAULT_EMBEDDING_DIM, DEFAULT_GLOBAL_MAX, DEFAULT_IMPORT_BATCH,
    DEFAULT_PER_CATEGORY_K,
};

#[derive(Parser)]
#[command(name = "solace")]
#[command(about = "Guidance from scripture, supplications and narrated sayings via semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    #[arg(long, global = true, env = "SOLACE_DATA_DIR", default_value = DEFAULT_DATA_DIR, help = "Directory holding the database and vector snapshots")]
    data_dir: PathBuf,
    #[arg(long, global = true, env = "SOLACE_EMBEDDING_DIM", default_value_t = DEFAULT_EMBEDDING_DIM, help = "Embedding dimension")]
    dimension: usize,
    #[arg(long, global = true, env = "SOLACE_PER_CATEGORY_K", default_value_t = DEFAULT_PER_CATEGORY_K, help = "Hits requested per category")]
    per_category: usize,
    #[arg(long, global = true, env = "SOLACE_MAX_RESULTS", default_value_t = DEFAULT_GLOBAL_MAX, help = "Maximum results after fusion")]
    max_results: usize,
    #[arg(short, long, global = true, help = "Verbose logging")]
    verbose: bool,
}

impl GlobalArgs {
    fn settings(&self) -> Settings {
        Settings {
            data_dir: self.data_dir.clone(),
            embedding_dimension: self.dimension,
            per_category_k: self.per_category,
            global_max: self.max_results,
            import_batch_size: DEFAULT_IMPORT_BATCH,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for guidance
    #[command(alias = "ask")]
    Guidance {
        query: String,
        #[arg(long, short, help = "Limit results (overrides --max-results)")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Import records from JSON Lines files
    Import {
        #[arg(help = "scripture, supplication or narrated-saying")]
        category: String,
        #[arg(help = "A .jsonl file or a directory of them")]
        path: PathBuf,
        #[arg(long, help = "Clear the category before importing")]
        replace: bool,
        #[arg(long, default_value_t = DEFAULT_IMPORT_BATCH, help = "Records per embedding batch")]
        batch_size: usize,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show or rebuild the vector index
    Index {
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Re-embed stored records (all categories unless one is given)")]
        rebuild: bool,
        #[arg(long, help = "Restrict --rebuild to one category")]
        category: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Check database and vector store health
    Health {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server exposing guidance tools
    #[cfg(feature = "mcp")]
    Mcp,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output and the MCP transport
    let default_level = if cli.global.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut settings = cli.global.settings();

    match cli.command {
        Commands::Guidance { query, limit, json } => {
            commands::guidance::run(&settings, &query, limit, json)
        }
        Commands::Import {
            category,
            path,
            replace,
            batch_size,
            json,
        } => {
            settings.import_batch_size = batch_size;
            commands::import::run(&settings, &category, &path, replace, json)
        }
        Commands::Index {
            status,
            rebuild,
            category,
            json,
        } => commands::index::run(&settings, status, rebuild, category.as_deref(), json),
        Commands::Health { json } => commands::health::run(&settings, json),

        #[cfg(feature = "mcp")]
        Commands::Mcp => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(mcp::run_mcp_server(settings))
        }
    }
}
