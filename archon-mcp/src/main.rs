//! Archon MCP Server
//!
//! A Model Context Protocol (MCP) server that exposes the Archon knowledge
//! base to AI agents over stdio transport.
//!
//! ## Usage
//!
//! ```bash
//! # Talk to the default backend (http://localhost:4001/api)
//! archon-mcp
//!
//! # Point at another deployment
//! archon-mcp --api-base http://archon.internal:4001/api
//!
//! # Enable verbose logging
//! archon-mcp --verbose
//! ```
//!
//! ## MCP Configuration
//!
//! Add to your MCP client configuration (e.g., Claude Desktop):
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "archon": {
//!       "command": "archon-mcp",
//!       "env": { "ARCHON_API_BASE": "http://localhost:4001/api" }
//!     }
//!   }
//! }
//! ```
//!
//! ## Available Tools
//!
//! - **perform_rag_query**: Knowledge-base search with optional reranking
//! - **search_code_examples**: Code-example search
//! - **get_available_sources**: List ingested knowledge sources
//! - **archon_health_check**: Backend health

use anyhow::Result;
use archon_bridge::config::{ENV_API_BASE, ENV_TIMEOUT_SECS};
use archon_bridge::mcp::McpServer;
use archon_bridge::Config;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Archon MCP Server - Expose the Archon knowledge base to AI agents via Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "archon-mcp")]
#[command(
    author,
    version,
    about = "Archon MCP Server - Model Context Protocol bridge to the Archon knowledge base"
)]
struct Args {
    /// Archon API base address
    #[arg(long, env = ENV_API_BASE)]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS)]
    timeout_secs: Option<u64>,

    /// Path to a YAML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable verbose logging (outputs to stderr)
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Args {
    fn resolve_config(&self) -> archon_bridge::Result<Config> {
        Config::load(self.config.as_deref())?
            .with_overrides(self.api_base.clone(), self.timeout_secs)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging to stderr (MCP uses stdout for protocol)
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        // By default, suppress all logging to avoid interfering with MCP protocol
        EnvFilter::new("error")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = args.resolve_config()?;

    tracing::info!(
        "Starting Archon MCP server against {} (timeout {}s)",
        config.api_base,
        config.timeout_secs
    );

    let server = McpServer::from_config(&config);

    let outcome = tokio::select! {
        result = server.run() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            None
        }
    };

    server.adapter().shutdown().await;

    match outcome {
        Some(result) => result?,
        // A pending stdin read holds a blocking-pool thread that cannot be
        // cancelled, so returning through the runtime would never finish.
        None => std::process::exit(0),
    }

    Ok(())
}
