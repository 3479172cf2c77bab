//! MCP tool definitions and dispatch
//!
//! Argument handling is deliberately loose: counts and flags are coerced from
//! numbers, integral floats, or strings, and fall back to their defaults when
//! absent. Only a missing `query` or an unknown tool is a protocol error.

use super::protocol::{JsonRpcError, ToolDefinition, ToolResult};
use crate::adapter::ArchonAdapter;
use crate::types::{CodeQuery, KnowledgeQuery, DEFAULT_CODE_MATCH_COUNT, DEFAULT_RAG_MATCH_COUNT};
use serde_json::{json, Value};

/// Knowledge query tool
pub const TOOL_RAG_QUERY: &str = "perform_rag_query";

/// Code-example search tool
pub const TOOL_CODE_EXAMPLES: &str = "search_code_examples";

/// Source listing tool
pub const TOOL_SOURCES: &str = "get_available_sources";

/// Health check tool
pub const TOOL_HEALTH: &str = "archon_health_check";

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: TOOL_RAG_QUERY.to_string(),
            description: "Perform a RAG (Retrieval-Augmented Generation) query against the Archon knowledge base. Returns formatted search results with relevant context.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find relevant information"
                    },
                    "match_count": {
                        "type": "integer",
                        "description": "Number of results to return (default: 5)",
                        "default": DEFAULT_RAG_MATCH_COUNT
                    },
                    "use_reranking": {
                        "type": "boolean",
                        "description": "Whether to use AI reranking for better results (default: true)",
                        "default": true
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: TOOL_CODE_EXAMPLES.to_string(),
            description: "Search for code examples in the Archon knowledge base. Returns formatted code examples with context.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find relevant code examples"
                    },
                    "match_count": {
                        "type": "integer",
                        "description": "Number of code examples to return (default: 3)",
                        "default": DEFAULT_CODE_MATCH_COUNT
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: TOOL_SOURCES.to_string(),
            description: "Get list of available knowledge sources in Archon, with type, URL, and document count.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: TOOL_HEALTH.to_string(),
            description: "Check if Archon services are running and healthy.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}

/// Handle tool call dispatch
pub async fn handle_tool_call(
    adapter: &ArchonAdapter,
    tool_name: &str,
    arguments: &Value,
) -> Result<ToolResult, JsonRpcError> {
    let text = match tool_name {
        TOOL_RAG_QUERY => {
            let query = KnowledgeQuery {
                query: required_query(arguments)?,
                match_count: arg_i64(arguments, "match_count").unwrap_or(DEFAULT_RAG_MATCH_COUNT),
                use_reranking: arg_bool(arguments, "use_reranking").unwrap_or(true),
            };
            adapter.perform_rag_query(&query).await
        }
        TOOL_CODE_EXAMPLES => {
            let query = CodeQuery {
                query: required_query(arguments)?,
                match_count: arg_i64(arguments, "match_count").unwrap_or(DEFAULT_CODE_MATCH_COUNT),
            };
            adapter.search_code_examples(&query).await
        }
        TOOL_SOURCES => adapter.get_available_sources().await,
        TOOL_HEALTH => adapter.health_check().await,
        _ => {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                tool_name
            )))
        }
    };

    Ok(ToolResult::text(text))
}

fn required_query(args: &Value) -> Result<String, JsonRpcError> {
    args.get("query")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| JsonRpcError::invalid_params("Missing query parameter"))
}

fn arg_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(coerce_i64)
}

fn arg_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(coerce_bool)
}

/// Coerce an integer argument from a JSON number or numeric string.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a boolean argument from a JSON bool or "true"/"false".
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
