//! MCP server implementation
//!
//! Implements the stdio transport for the Model Context Protocol:
//! newline-delimited JSON-RPC messages in, newline-delimited responses out.
//! Each request runs as its own task so a slow backend call does not hold
//! up `ping` or `tools/list`; `notifications/cancelled` aborts a request
//! that is still in flight. A request reusing the id of one still in flight
//! is rejected with -32600.

use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolResult,
    MCP_PROTOCOL_VERSION,
};
use super::tools::{get_tool_definitions, handle_tool_call};
use crate::adapter::ArchonAdapter;
use crate::config::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};

const INSTRUCTIONS: &str = "Archon knowledge base bridge. Use perform_rag_query for documentation \
     questions, search_code_examples for code snippets, get_available_sources to see what has been \
     ingested, and archon_health_check to verify the backend is reachable.";

type InFlight = Arc<Mutex<HashMap<String, AbortHandle>>>;

/// MCP server for the Archon bridge
///
/// Cheap to clone; clones share the same adapter and therefore the same
/// HTTP connection.
#[derive(Clone)]
pub struct McpServer {
    adapter: Arc<ArchonAdapter>,
}

impl McpServer {
    /// Create a server around an adapter
    pub fn new(adapter: Arc<ArchonAdapter>) -> Self {
        Self { adapter }
    }

    /// Create a server with a fresh adapter built from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(ArchonAdapter::from_config(config)))
    }

    /// The adapter tool calls are routed to
    pub fn adapter(&self) -> &Arc<ArchonAdapter> {
        &self.adapter
    }

    /// Run the MCP server on stdio
    ///
    /// Returns once stdin reaches EOF and every in-flight request has been
    /// answered. Releasing the connection is left to the caller.
    pub async fn run(&self) -> crate::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve MCP over an arbitrary line-oriented reader and writer.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> crate::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "Archon MCP server started (protocol version {}, backend {})",
            MCP_PROTOCOL_VERSION,
            self.adapter.client().base_url()
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut lines = reader.lines();
        let mut reading = true;

        loop {
            if !reading && tasks.is_empty() {
                while let Ok(response) = rx.try_recv() {
                    write_response(&mut writer, &response).await?;
                }
                break;
            }

            tokio::select! {
                line = lines.next_line(), if reading => match line {
                    Ok(Some(line)) => {
                        self.dispatch_line(&line, &tx, &mut tasks, &in_flight);
                    }
                    Ok(None) => {
                        tracing::info!("EOF received, waiting for {} in-flight request(s)", tasks.len());
                        reading = false;
                    }
                    Err(e) => {
                        tracing::error!("Read error: {}", e);
                        reading = false;
                    }
                },
                Some(response) = rx.recv() => {
                    write_response(&mut writer, &response).await?;
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        tracing::info!("Archon MCP server stopped");
        Ok(())
    }

    fn dispatch_line(
        &self,
        line: &str,
        tx: &mpsc::UnboundedSender<JsonRpcResponse>,
        tasks: &mut JoinSet<()>,
        in_flight: &InFlight,
    ) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        tracing::debug!("Received: {}", line);

        let request = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => request,
            Err(e) => {
                let _ = tx.send(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {}", e)),
                ));
                return;
            }
        };

        if request.is_notification() {
            self.handle_notification(&request, in_flight);
            return;
        }

        let key = request_key(request.id.as_ref());

        // Hold the registry lock across spawn + insert so the task cannot
        // finish and deregister before it is registered.
        let mut guard = lock(in_flight);
        if guard.contains_key(&key) {
            tracing::warn!("Rejected request reusing in-flight id {}", key);
            let _ = tx.send(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!("Request id {} is already in flight", key)),
            ));
            return;
        }

        let server = self.clone();
        let tx = tx.clone();
        let registry = Arc::clone(in_flight);
        let task_key = key.clone();
        let handle = tasks.spawn(async move {
            let response = server.handle_request(request).await;
            let still_wanted = lock(&registry).remove(&task_key).is_some();
            if still_wanted {
                let _ = tx.send(response);
            }
        });
        guard.insert(key, handle);
    }

    fn handle_notification(&self, request: &JsonRpcRequest, in_flight: &InFlight) {
        match request.method.as_str() {
            "notifications/cancelled" => {
                let target = request.params.as_ref().and_then(|p| p.get("requestId"));
                let Some(target) = target else {
                    tracing::debug!("Cancellation without requestId ignored");
                    return;
                };
                let key = request_key(Some(target));
                if let Some(handle) = lock(in_flight).remove(&key) {
                    handle.abort();
                    tracing::info!("Cancelled request {}", key);
                } else {
                    tracing::debug!("Cancellation for unknown or finished request {}", key);
                }
            }
            method => tracing::debug!("Notification {} ignored", method),
        }
    }

    /// Handle a single JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "notifications/initialized" => {
                // Sent with an id by some clients; acknowledge with empty result
                return JsonRpcResponse::success(request.id, json!({}));
            }
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "ping" => Ok(json!({})),
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, _params: &Option<Value>) -> Result<Value, JsonRpcError> {
        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
            "instructions": INSTRUCTIONS
        }))
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        Ok(json!({ "tools": get_tool_definitions() }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

        let arguments = match params.get("arguments") {
            Some(Value::Null) | None => json!({}),
            Some(args) => args.clone(),
        };

        tracing::debug!("Calling tool {}", tool_name);
        let result: ToolResult = handle_tool_call(&self.adapter, tool_name, &arguments).await?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> crate::Result<()> {
    let response_json = serde_json::to_string(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    tracing::debug!("Sent: {}", response_json);
    Ok(())
}

fn request_key(id: Option<&Value>) -> String {
    id.map(Value::to_string).unwrap_or_default()
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
