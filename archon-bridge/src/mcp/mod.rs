//! MCP (Model Context Protocol) server for the Archon bridge
//!
//! This module implements an MCP server using stdio transport, exposing the
//! Archon knowledge base to AI agents.
//!
//! ## Tools Exposed
//!
//! - `perform_rag_query` - Knowledge-base search with optional reranking
//! - `search_code_examples` - Code-example search
//! - `get_available_sources` - Ingested knowledge sources
//! - `archon_health_check` - Backend health
//!
//! ## Usage
//!
//! ```rust,ignore
//! use archon_bridge::{mcp::McpServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = McpServer::from_config(&Config::default());
//!     server.run().await.unwrap();
//!     server.adapter().shutdown().await;
//! }
//! ```

mod protocol;
mod server;
pub mod tools;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolContent, ToolDefinition, ToolResult,
    MCP_PROTOCOL_VERSION,
};
pub use server::McpServer;
