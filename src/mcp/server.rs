//! Guidance MCP Server implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use solace::search::CollectionStats;
use solace::{GuidanceEngine, GuidanceError, Settings};

/// Upper bound on `limit` accepted from clients
const MAX_LIMIT: usize = 50;

/// Parameters for get_guidance tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GuidanceParams {
    /// How the user feels or what they are going through (3-500 characters)
    #[schemars(description = "Natural language description of the user's situation or feeling")]
    pub query: String,
    /// Maximum number of results (defaults to the server's configured cap)
    #[schemars(description = "Maximum number of results")]
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct IndexStatusJson {
    dimension: usize,
    total_indexed: usize,
    collections: Vec<CollectionStats>,
}

fn to_mcp_error(e: GuidanceError) -> McpError {
    match e {
        GuidanceError::Validation(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(format!("Guidance lookup failed: {}", other), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

/// Guidance MCP Service
#[derive(Clone)]
pub struct GuidanceService {
    engine: Arc<GuidanceEngine>,
    tool_router: ToolRouter<Self>,
}

impl GuidanceService {
    pub fn new(engine: Arc<GuidanceEngine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl GuidanceService {
    /// Ranked guidance for an emotional query
    #[tool(description = "Find Quran verses, duas and hadith relevant to how the user feels. Returns results ranked by semantic similarity, each with original text, translation, citation and a similarity score between 0 and 1.")]
    async fn get_guidance(
        &self,
        Parameters(params): Parameters<GuidanceParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.limit.map(|l| l.clamp(1, MAX_LIMIT));
        let engine = self.engine.clone();

        // Embedding and scanning are CPU-bound
        let response = tokio::task::spawn_blocking(move || engine.respond(&params.query, limit))
            .await
            .map_err(|e| McpError::internal_error(format!("Search task failed: {}", e), None))?
            .map_err(to_mcp_error)?;

        json_result(&response)
    }

    /// Database and vector store health
    #[tool(description = "Check whether the guidance database and vector store are available.")]
    async fn guidance_health(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.engine.health())
    }

    /// Per-category index sizes
    #[tool(description = "Report how many entries each guidance collection holds.")]
    async fn index_status(&self) -> Result<CallToolResult, McpError> {
        let registry = self.engine.registry();
        json_result(&IndexStatusJson {
            dimension: registry.dimension(),
            total_indexed: registry.total_entries(),
            collections: registry.stats(),
        })
    }
}

#[tool_handler]
impl ServerHandler for GuidanceService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Spiritual guidance server. Use get_guidance with a description of how the user \
                 feels to retrieve relevant Quran verses, duas and hadith."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

/// Run the MCP server on stdio
pub async fn run_mcp_server(settings: Settings) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let engine = GuidanceEngine::open(&settings).context("Failed to open guidance engine")?;
    info!(
        entries = engine.registry().total_entries(),
        "guidance engine ready, starting MCP server"
    );

    let service = GuidanceService::new(Arc::new(engine));
    let transport = (stdin(), stdout());
    let server = service
        .serve(transport)
        .await
        .context("Failed to start MCP server")?;
    server.waiting().await?;

    Ok(())
}
