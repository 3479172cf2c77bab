//! Archon Bridge CLI - run bridge operations from the terminal
//!
//! Prints exactly the text an agent would receive from the matching MCP tool,
//! which makes it handy for checking a deployment by hand.

use anyhow::Result;
use archon_bridge::config::{ENV_API_BASE, ENV_TIMEOUT_SECS};
use archon_bridge::mcp::{tools, McpServer};
use archon_bridge::types::{DEFAULT_CODE_MATCH_COUNT, DEFAULT_RAG_MATCH_COUNT};
use archon_bridge::{ArchonAdapter, CodeQuery, Config, KnowledgeQuery};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "archon-bridge")]
#[command(
    author,
    version,
    about = "Archon Bridge - query the Archon knowledge base from the command line"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Archon API base address
    #[arg(long, env = ENV_API_BASE, global = true)]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, global = true)]
    timeout_secs: Option<u64>,

    /// Path to a YAML config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the knowledge base
    Query {
        /// Search query
        query: String,

        /// Number of results to return
        #[arg(long, short = 'n', default_value_t = DEFAULT_RAG_MATCH_COUNT, allow_negative_numbers = true)]
        match_count: i64,

        /// Disable AI reranking
        #[arg(long)]
        no_rerank: bool,
    },

    /// Search code examples
    Code {
        /// Search query
        query: String,

        /// Number of examples to return
        #[arg(long, short = 'n', default_value_t = DEFAULT_CODE_MATCH_COUNT, allow_negative_numbers = true)]
        match_count: i64,
    },

    /// List available knowledge sources
    Sources,

    /// Check backend health
    Health,

    /// List the MCP tools this bridge exposes
    Tools,

    /// Show the resolved configuration
    Config,

    /// Start MCP server (stdio transport)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results (and for `serve`)
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.api_base.clone(), cli.timeout_secs)?;

    match cli.command {
        Commands::Query {
            query,
            match_count,
            no_rerank,
        } => {
            let query = KnowledgeQuery {
                query,
                match_count,
                use_reranking: !no_rerank,
            };
            run_operation(&config, |adapter| async move {
                adapter.perform_rag_query(&query).await
            })
            .await
        }
        Commands::Code { query, match_count } => {
            let query = CodeQuery { query, match_count };
            run_operation(&config, |adapter| async move {
                adapter.search_code_examples(&query).await
            })
            .await
        }
        Commands::Sources => {
            run_operation(&config, |adapter| async move {
                adapter.get_available_sources().await
            })
            .await
        }
        Commands::Health => {
            run_operation(&config, |adapter| async move { adapter.health_check().await }).await
        }
        Commands::Tools => cmd_tools(),
        Commands::Config => cmd_config(&config),
        Commands::Serve => cmd_serve(&config).await,
    }
}

/// Run one operation, print its text, and release the connection.
async fn run_operation<F, Fut>(config: &Config, op: F) -> Result<()>
where
    F: FnOnce(Arc<ArchonAdapter>) -> Fut,
    Fut: std::future::Future<Output = String>,
{
    tracing::debug!("Using Archon API at {}", config.api_base);
    let adapter = Arc::new(ArchonAdapter::from_config(config));
    let text = op(Arc::clone(&adapter)).await;
    adapter.shutdown().await;
    println!("{}", text);
    Ok(())
}

fn cmd_tools() -> Result<()> {
    for tool in tools::get_tool_definitions() {
        println!("{}\n    {}", tool.name, tool.description);
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

async fn cmd_serve(config: &Config) -> Result<()> {
    tracing::info!("Serving MCP on stdio against {}", config.api_base);
    let server = McpServer::from_config(config);

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
        // The stdin reader thread cannot be cancelled; exit without
        // waiting for the runtime to join it.
        None => std::process::exit(0),
    }
    Ok(())
}
