//! The four bridge operations.
//!
//! Every operation returns text and never an error: backend status codes,
//! transport faults, and malformed bodies are all rendered into the result
//! string so the host always receives a well-formed tool result.

use crate::client::ArchonClient;
use crate::config::Config;
use crate::format;
use crate::types::{CodeQuery, KnowledgeQuery};
use std::time::Duration;

/// Translates tool invocations into Archon API calls and renders the replies
#[derive(Debug)]
pub struct ArchonAdapter {
    client: ArchonClient,
}

impl ArchonAdapter {
    /// Create an adapter from resolved configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_client(ArchonClient::from_config(config))
    }

    /// Create an adapter for an explicit base address and timeout
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_client(ArchonClient::new(base_url, timeout))
    }

    /// Create an adapter around an existing client
    pub fn with_client(client: ArchonClient) -> Self {
        Self { client }
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &ArchonClient {
        &self.client
    }

    /// Search the knowledge base and render matching passages.
    pub async fn perform_rag_query(&self, query: &KnowledgeQuery) -> String {
        match self.client.search_knowledge(query).await {
            Ok(response) => format::knowledge_results(&query.query, &response.results),
            Err(e) => {
                tracing::warn!("RAG query failed: {}", e);
                format::failure(format::RAG_ERROR_PREFIX, &e)
            }
        }
    }

    /// Search indexed code examples and render them as fenced blocks.
    pub async fn search_code_examples(&self, query: &CodeQuery) -> String {
        match self.client.search_code(query).await {
            Ok(response) => format::code_examples(&query.query, &response.results),
            Err(e) => {
                tracing::warn!("Code example search failed: {}", e);
                format::failure(format::CODE_ERROR_PREFIX, &e)
            }
        }
    }

    /// List the knowledge sources the backend has ingested.
    pub async fn get_available_sources(&self) -> String {
        match self.client.list_sources().await {
            Ok(response) => format::sources(&response.sources),
            Err(e) => {
                tracing::warn!("Listing sources failed: {}", e);
                format::failure(format::SOURCES_ERROR_PREFIX, &e)
            }
        }
    }

    /// Check backend health.
    pub async fn health_check(&self) -> String {
        match self.client.health().await {
            Ok(body) => format::health(&body),
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                format::failure(format::HEALTH_ERROR_PREFIX, &e)
            }
        }
    }

    /// Release the shared connection. Idempotent.
    pub async fn shutdown(&self) {
        if self.client.close().await {
            tracing::info!("Adapter shut down");
        }
    }
}
