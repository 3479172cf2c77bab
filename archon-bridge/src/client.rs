//! HTTP client for the Archon knowledge API.
//!
//! Endpoints, relative to the configured base address:
//!
//! - `POST /knowledge/search` (knowledge query)
//! - `POST /knowledge/search-code` (code-example search)
//! - `GET  /knowledge/sources` (source listing)
//! - `GET  /health`
//!
//! Each call performs exactly one round trip on the shared connection. Only
//! `200 OK` counts as success; any other status (other 2xx codes included)
//! short-circuits to [`Error::Status`] without reading the body.

use crate::config::Config;
use crate::connection::SharedConnection;
use crate::error::{Error, Result};
use crate::types::{CodeQuery, KnowledgeQuery, SearchResponse, SourcesResponse};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Typed client over the shared connection
#[derive(Debug)]
pub struct ArchonClient {
    base_url: String,
    connection: SharedConnection,
}

impl ArchonClient {
    /// Build a client from resolved configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base, config.timeout())
    }

    /// Build a client with an explicit base address and timeout
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            connection: SharedConnection::new(timeout),
        }
    }

    /// Base address requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared connection holder
    pub fn connection(&self) -> &SharedConnection {
        &self.connection
    }

    /// `POST /knowledge/search`
    pub async fn search_knowledge(&self, query: &KnowledgeQuery) -> Result<SearchResponse> {
        self.send(Method::POST, "/knowledge/search", Some(query)).await
    }

    /// `POST /knowledge/search-code`
    pub async fn search_code(&self, query: &CodeQuery) -> Result<SearchResponse> {
        self.send(Method::POST, "/knowledge/search-code", Some(query))
            .await
    }

    /// `GET /knowledge/sources`
    pub async fn list_sources(&self) -> Result<SourcesResponse> {
        self.send::<(), _>(Method::GET, "/knowledge/sources", None)
            .await
    }

    /// `GET /health`, returned as untyped JSON
    pub async fn health(&self) -> Result<Value> {
        self.send::<(), _>(Method::GET, "/health", None).await
    }

    /// Release the shared connection. Safe to call more than once.
    pub async fn close(&self) -> bool {
        self.connection.release().await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let client = self.connection.acquire().await?;
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!("{} {}", method, url);

        let mut request = client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} -> {}", url, status);

        if status != StatusCode::OK {
            return Err(Error::Status {
                code: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}
