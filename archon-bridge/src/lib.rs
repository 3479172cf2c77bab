//! # Archon Bridge
//!
//! Exposes the Archon knowledge-base HTTP API as MCP tools for AI agents.
//!
//! Archon Bridge provides:
//! - **Knowledge queries** with optional reranking
//! - **Code-example search**
//! - **Source listing** and a **health check**
//! - **MCP server** over stdio for agent integration
//!
//! Every operation returns Markdown-flavored text. Backend failures are
//! rendered into that text rather than raised, so the calling agent always
//! receives a usable tool result.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use archon_bridge::{ArchonAdapter, Config, KnowledgeQuery};
//!
//! let adapter = ArchonAdapter::from_config(&Config::default());
//! let text = adapter.perform_rag_query(&KnowledgeQuery::new("vector search")).await;
//! println!("{}", text);
//! adapter.shutdown().await;
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod format;
pub mod mcp;
pub mod types;

// Re-exports for convenience
pub use adapter::ArchonAdapter;
pub use client::ArchonClient;
pub use config::{Config, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};
pub use connection::SharedConnection;
pub use error::{Error, Result};
pub use types::{CodeQuery, KnowledgeQuery, KnowledgeSource, SearchHit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
