//! MCP server exposing guidance lookups as tools
//!
//! The engine is opened once at startup and shared by every tool call.

mod server;

pub use server::run_mcp_server;
