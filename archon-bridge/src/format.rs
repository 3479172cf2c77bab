//! Markdown-flavored text rendering for tool results
//!
//! Output here is consumed by agents and compared byte-for-byte by
//! existing clients; keep the literals stable.

use crate::error::Error;
use crate::types::{KnowledgeSource, SearchHit};
use serde_json::Value;

/// Prefix of knowledge-query failure messages
pub const RAG_ERROR_PREFIX: &str = "Error performing RAG query";

/// Prefix of code-search failure messages
pub const CODE_ERROR_PREFIX: &str = "Error searching code examples";

/// Prefix of source-listing failure messages
pub const SOURCES_ERROR_PREFIX: &str = "Error getting sources";

/// Prefix of health-check failure messages
pub const HEALTH_ERROR_PREFIX: &str = "❌ Archon health check failed";

/// Message returned when the backend knows no sources
pub const NO_SOURCES_MESSAGE: &str = "No knowledge sources available in Archon.";

/// Render knowledge-query hits. Ordinals are 1-based in backend order.
pub fn knowledge_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for query: {}", query);
    }

    let mut lines = vec![format!("# RAG Query Results for: {}\n", query)];
    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!("## Result {}: {}", i + 1, hit.title));
        if !hit.url.is_empty() {
            lines.push(format!("**Source:** {}", hit.url));
        }
        lines.push(format!("**Content:**\n{}\n", hit.content));
    }
    lines.join("\n")
}

/// Render code-example hits, each body fenced as a code block.
pub fn code_examples(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No code examples found for query: {}", query);
    }

    let mut lines = vec![format!("# Code Examples for: {}\n", query)];
    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!("## Example {}: {}", i + 1, hit.title));
        lines.push(format!("```\n{}\n```\n", hit.content));
    }
    lines.join("\n")
}

/// Render the source listing; each section ends with a blank line.
pub fn sources(sources: &[KnowledgeSource]) -> String {
    if sources.is_empty() {
        return NO_SOURCES_MESSAGE.to_string();
    }

    let mut lines = vec!["# Available Knowledge Sources\n".to_string()];
    for source in sources {
        lines.push(format!("## {}", source.title));
        lines.push(format!("- **Type:** {}", source.source_type));
        lines.push(format!("- **URL:** {}", source.url));
        lines.push(format!("- **Documents:** {}", plain(&source.documents_count)));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Render a healthy status with the backend's body pretty-printed.
///
/// Non-ASCII characters are written as `\uXXXX` escapes (UTF-16 units).
pub fn health(body: &Value) -> String {
    let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    format!("✅ Archon is healthy: {}", escape_non_ascii(&pretty))
}

/// Scalars print bare (strings without quotes); anything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// Only string contents can hold non-ASCII in serialized JSON, so escaping
// every such char in the document is equivalent to escaping inside strings.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Render any failure as `<prefix>: <detail>`
pub fn failure(prefix: &str, err: &Error) -> String {
    format!("{}: {}", prefix, err)
}
