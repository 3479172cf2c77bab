//! Request and response records for the Archon knowledge API
//!
//! Response records are lenient: absent fields and JSON `null` both fall
//! back to the documented defaults while deserializing, so rendering code
//! never has to deal with missing data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Title used when a search hit carries no source title
pub const UNKNOWN_SOURCE_TITLE: &str = "Unknown Source";

/// Title used when a knowledge source has no title
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Type used when a knowledge source has no type
pub const UNKNOWN_TYPE: &str = "unknown";

/// URL used when a knowledge source has no URL
pub const MISSING_URL: &str = "N/A";

/// Default result count for knowledge queries
pub const DEFAULT_RAG_MATCH_COUNT: i64 = 5;

/// Default result count for code-example searches
pub const DEFAULT_CODE_MATCH_COUNT: i64 = 3;

/// Body of `POST /knowledge/search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeQuery {
    pub query: String,
    pub match_count: i64,
    pub use_reranking: bool,
}

impl KnowledgeQuery {
    /// Create a query with the default count and reranking enabled
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            match_count: DEFAULT_RAG_MATCH_COUNT,
            use_reranking: true,
        }
    }
}

/// Body of `POST /knowledge/search-code`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeQuery {
    pub query: String,
    pub match_count: i64,
}

impl CodeQuery {
    /// Create a query with the default count
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            match_count: DEFAULT_CODE_MATCH_COUNT,
        }
    }
}

/// Response of both search endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchHit>,
}

/// One search result, in backend order
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSearchHit")]
pub struct SearchHit {
    pub content: String,
    pub title: String,
    /// Empty when the backend gave no URL
    pub url: String,
}

#[derive(Deserialize)]
struct RawSearchHit {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    source: Option<RawHitSource>,
}

#[derive(Deserialize)]
struct RawHitSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl From<RawSearchHit> for SearchHit {
    fn from(raw: RawSearchHit) -> Self {
        let (title, url) = match raw.source {
            Some(source) => (source.title, source.url),
            None => (None, None),
        };
        Self {
            content: raw.content.unwrap_or_default(),
            title: title.unwrap_or_else(|| UNKNOWN_SOURCE_TITLE.to_string()),
            url: url.unwrap_or_default(),
        }
    }
}

/// Response of `GET /knowledge/sources`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<KnowledgeSource>,
}

/// A crawled site or uploaded document set known to the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawKnowledgeSource")]
pub struct KnowledgeSource {
    pub title: String,
    pub url: String,
    pub source_type: String,
    /// Count exactly as the backend sent it (usually an integer)
    pub documents_count: Value,
}

#[derive(Deserialize)]
struct RawKnowledgeSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "type")]
    source_type: Option<String>,
    #[serde(default)]
    documents_count: Option<Value>,
}

impl From<RawKnowledgeSource> for KnowledgeSource {
    fn from(raw: RawKnowledgeSource) -> Self {
        Self {
            title: raw.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            url: raw.url.unwrap_or_else(|| MISSING_URL.to_string()),
            source_type: raw.source_type.unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
            documents_count: raw.documents_count.unwrap_or_else(|| Value::from(0)),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
