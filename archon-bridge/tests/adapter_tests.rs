//! Integration tests for the bridge operations
//!
//! Each test runs the adapter against an in-process stub of the Archon API
//! and checks the exact text an agent would receive.

mod common;

use archon_bridge::{ArchonAdapter, CodeQuery, KnowledgeQuery};
use common::StubBackend;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SEARCH: &str = "/api/knowledge/search";
const SEARCH_CODE: &str = "/api/knowledge/search-code";
const SOURCES: &str = "/api/knowledge/sources";
const HEALTH: &str = "/api/health";

async fn adapter_for(stub: &StubBackend) -> ArchonAdapter {
    let base = stub.start().await;
    ArchonAdapter::new(&base, Duration::from_secs(30))
}

#[tokio::test]
async fn test_rag_query_url_line_only_when_present() {
    let stub = StubBackend::new().reply(
        SEARCH,
        200,
        json!({
            "results": [
                {"content": "Use tokio::spawn.", "source": {"title": "Tokio Guide", "url": "https://tokio.rs/guide"}},
                {"content": "Spawned tasks are 'static.", "source": {}}
            ]
        }),
    );
    let adapter = adapter_for(&stub).await;

    let text = adapter
        .perform_rag_query(&KnowledgeQuery::new("spawning tasks"))
        .await;

    assert_eq!(
        text,
        "# RAG Query Results for: spawning tasks\n\n\
         ## Result 1: Tokio Guide\n\
         **Source:** https://tokio.rs/guide\n\
         **Content:**\nUse tokio::spawn.\n\n\
         ## Result 2: Unknown Source\n\
         **Content:**\nSpawned tasks are 'static.\n"
    );
    assert_eq!(text.matches("**Source:**").count(), 1);
}

#[tokio::test]
async fn test_rag_query_sends_all_fields() {
    let stub = StubBackend::new().reply(SEARCH, 200, json!({"results": []}));
    let adapter = adapter_for(&stub).await;

    let query = KnowledgeQuery {
        query: "embeddings".to_string(),
        match_count: 8,
        use_reranking: false,
    };
    adapter.perform_rag_query(&query).await;

    let received = stub.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    assert_eq!(
        received[0].body,
        json!({"query": "embeddings", "match_count": 8, "use_reranking": false})
    );
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_negative_count_passed_through() {
    let stub = StubBackend::new().reply(SEARCH_CODE, 200, json!({"results": []}));
    let adapter = adapter_for(&stub).await;

    let query = CodeQuery {
        query: "retry".to_string(),
        match_count: -1,
    };
    adapter.search_code_examples(&query).await;

    assert_eq!(stub.received()[0].body["match_count"], -1);
}

#[tokio::test]
async fn test_empty_results_messages() {
    let stub = StubBackend::new()
        .reply(SEARCH, 200, json!({"results": []}))
        .reply(SEARCH_CODE, 200, json!({}))
        .reply(SOURCES, 200, json!({"sources": []}));
    let adapter = adapter_for(&stub).await;

    let rag = adapter.perform_rag_query(&KnowledgeQuery::new("zebra")).await;
    assert_eq!(rag, "No results found for query: zebra");

    let code = adapter.search_code_examples(&CodeQuery::new("zebra")).await;
    assert_eq!(code, "No code examples found for query: zebra");

    let sources = adapter.get_available_sources().await;
    assert_eq!(sources, "No knowledge sources available in Archon.");

    for text in [rag, code, sources] {
        assert!(!text.contains('#'));
    }
}

#[tokio::test]
async fn test_server_error_status_for_every_operation() {
    let stub = StubBackend::new()
        .reply(SEARCH, 500, json!({"results": [{"content": "ignored"}]}))
        .reply(SEARCH_CODE, 500, json!({}))
        .reply(SOURCES, 500, json!({}))
        .reply(HEALTH, 500, json!({"status": "down"}));
    let adapter = adapter_for(&stub).await;

    let outputs = [
        adapter.perform_rag_query(&KnowledgeQuery::new("q")).await,
        adapter.search_code_examples(&CodeQuery::new("q")).await,
        adapter.get_available_sources().await,
        adapter.health_check().await,
    ];

    assert_eq!(outputs[0], "Error performing RAG query: HTTP 500");
    assert_eq!(outputs[1], "Error searching code examples: HTTP 500");
    assert_eq!(outputs[2], "Error getting sources: HTTP 500");
    assert_eq!(outputs[3], "❌ Archon health check failed: HTTP 500");
    for text in &outputs {
        assert!(text.contains("500"));
        assert!(!text.contains("##"));
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_not_parsed() {
    let stub = StubBackend::new().reply_raw(SOURCES, 404, "<html>not found</html>");
    let adapter = adapter_for(&stub).await;

    assert_eq!(
        adapter.get_available_sources().await,
        "Error getting sources: HTTP 404"
    );
}

#[tokio::test]
async fn test_other_2xx_statuses_are_failures() {
    let stub = StubBackend::new()
        .reply(HEALTH, 201, json!({"status": "created"}))
        .reply_raw(SOURCES, 204, "")
        .reply(SEARCH, 202, json!({"results": [{"content": "queued"}]}));
    let adapter = adapter_for(&stub).await;

    assert_eq!(
        adapter.health_check().await,
        "❌ Archon health check failed: HTTP 201"
    );
    assert_eq!(
        adapter.get_available_sources().await,
        "Error getting sources: HTTP 204"
    );
    assert_eq!(
        adapter
            .perform_rag_query(&KnowledgeQuery::new("queued"))
            .await,
        "Error performing RAG query: HTTP 202"
    );
}

#[tokio::test]
async fn test_code_examples_fenced() {
    let stub = StubBackend::new().reply(
        SEARCH_CODE,
        200,
        json!({
            "results": [
                {"content": "let x = 1;", "source": {"title": "Snippets", "url": "https://ignored"}},
                {"content": "fn f() {}"}
            ]
        }),
    );
    let adapter = adapter_for(&stub).await;

    let text = adapter.search_code_examples(&CodeQuery::new("let")).await;
    assert_eq!(
        text,
        "# Code Examples for: let\n\n\
         ## Example 1: Snippets\n\
         ```\nlet x = 1;\n```\n\n\
         ## Example 2: Unknown Source\n\
         ```\nfn f() {}\n```\n"
    );
    assert!(!text.contains("https://ignored"));
}

#[tokio::test]
async fn test_sources_missing_document_count_shows_zero() {
    let stub = StubBackend::new().reply(
        SOURCES,
        200,
        json!({
            "sources": [
                {"title": "Rust Book", "url": "https://doc.rust-lang.org/book", "type": "website", "documents_count": 120},
                {"title": "Notes", "type": "upload"}
            ]
        }),
    );
    let adapter = adapter_for(&stub).await;

    let text = adapter.get_available_sources().await;
    assert_eq!(
        text,
        "# Available Knowledge Sources\n\n\
         ## Rust Book\n\
         - **Type:** website\n\
         - **URL:** https://doc.rust-lang.org/book\n\
         - **Documents:** 120\n\n\
         ## Notes\n\
         - **Type:** upload\n\
         - **URL:** N/A\n\
         - **Documents:** 0\n"
    );
    assert_eq!(stub.received()[0].method, "GET");
}

#[tokio::test]
async fn test_health_check_is_idempotent() {
    let stub = StubBackend::new().reply(
        HEALTH,
        200,
        json!({"status": "healthy", "services": {"api": "up", "db": "up"}}),
    );
    let adapter = adapter_for(&stub).await;

    let first = adapter.health_check().await;
    let second = adapter.health_check().await;

    assert_eq!(first, second);
    assert!(first.starts_with("✅ Archon is healthy: {\n  \"status\": \"healthy\""));
    assert!(first.contains("\"services\": {\n    \"api\": \"up\""));
}

#[tokio::test]
async fn test_health_request_sends_json_content_type() {
    let stub = StubBackend::new().reply(HEALTH, 200, json!({}));
    let adapter = adapter_for(&stub).await;
    adapter.health_check().await;

    let received = stub.received();
    assert_eq!(received[0].path, "/api/health");
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_malformed_success_body_is_failure_text() {
    let stub = StubBackend::new().reply_raw(SEARCH, 200, "{not json");
    let adapter = adapter_for(&stub).await;

    let text = adapter.perform_rag_query(&KnowledgeQuery::new("q")).await;
    assert!(text.starts_with("Error performing RAG query: "));
    assert!(!text.contains("HTTP"));
}

#[tokio::test]
async fn test_unreachable_backend_is_failure_text() {
    let adapter = ArchonAdapter::new("http://127.0.0.1:1/api", Duration::from_secs(5));

    let text = adapter.get_available_sources().await;
    assert!(text.starts_with("Error getting sources: "));
    assert!(text.len() > "Error getting sources: ".len());
}

#[tokio::test]
async fn test_timeout_takes_failure_path() {
    let stub = StubBackend::new().reply_after(HEALTH, Duration::from_secs(5), json!({}));
    let base = stub.start().await;
    let adapter = ArchonAdapter::new(&base, Duration::from_millis(200));

    let text = adapter.health_check().await;
    assert!(text.starts_with("❌ Archon health check failed: "));
    assert!(text.contains("timed out"), "unexpected text: {}", text);
}

#[tokio::test]
async fn test_sequential_operations_share_one_connection() {
    let stub = StubBackend::new()
        .reply(SEARCH, 200, json!({"results": []}))
        .reply(SOURCES, 200, json!({"sources": []}))
        .reply(HEALTH, 200, json!({}));
    let adapter = adapter_for(&stub).await;
    assert_eq!(adapter.client().connection().connections_created(), 0);

    adapter.perform_rag_query(&KnowledgeQuery::new("a")).await;
    adapter.get_available_sources().await;
    adapter.health_check().await;

    assert_eq!(adapter.client().connection().connections_created(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_share_one_connection() {
    let stub = StubBackend::new()
        .reply(SEARCH, 200, json!({"results": []}))
        .reply(SEARCH_CODE, 200, json!({"results": []}))
        .reply(SOURCES, 200, json!({"sources": []}))
        .reply(HEALTH, 200, json!({}));
    let adapter = Arc::new(adapter_for(&stub).await);

    let mut handles = Vec::new();
    for i in 0..16 {
        let adapter = Arc::clone(&adapter);
        handles.push(tokio::spawn(async move {
            match i % 4 {
                0 => adapter.perform_rag_query(&KnowledgeQuery::new("a")).await,
                1 => adapter.search_code_examples(&CodeQuery::new("b")).await,
                2 => adapter.get_available_sources().await,
                _ => adapter.health_check().await,
            }
        }));
    }
    for handle in handles {
        let text = handle.await.unwrap();
        assert!(!text.contains("Error"), "unexpected failure: {}", text);
    }

    assert_eq!(adapter.client().connection().connections_created(), 1);
    assert_eq!(stub.received().len(), 16);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let stub = StubBackend::new().reply(HEALTH, 200, json!({}));
    let adapter = adapter_for(&stub).await;

    // Never used: release is a no-op
    let unused = ArchonAdapter::new("http://127.0.0.1:1/api", Duration::from_secs(1));
    unused.shutdown().await;
    unused.shutdown().await;
    assert!(!unused.client().connection().is_established().await);

    adapter.health_check().await;
    assert!(adapter.client().connection().is_established().await);
    adapter.shutdown().await;
    adapter.shutdown().await;
    assert!(!adapter.client().connection().is_established().await);
    assert!(adapter.client().connection().is_released().await);
}

#[tokio::test]
async fn test_operations_after_shutdown_do_not_reconnect() {
    let stub = StubBackend::new().reply(HEALTH, 200, json!({}));
    let adapter = adapter_for(&stub).await;

    adapter.health_check().await;
    adapter.shutdown().await;

    let text = adapter.health_check().await;
    assert_eq!(
        text,
        "❌ Archon health check failed: Connection to the knowledge base has been closed"
    );
    assert_eq!(adapter.client().connection().connections_created(), 1);
    assert_eq!(stub.received().len(), 1);
}
