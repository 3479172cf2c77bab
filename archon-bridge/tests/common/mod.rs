//! In-process stand-in for the Archon HTTP API.
//!
//! Routes are registered by full path (including the `/api` prefix) with a
//! canned status and body. Every request is recorded so tests can inspect
//! what the bridge actually sent.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request received by the stub backend
#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

/// Stub backend builder and request log
#[derive(Clone, Default)]
pub struct StubBackend {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with `status` and a JSON body
    pub fn reply(self, path: &str, status: u16, body: Value) -> Self {
        self.reply_raw(path, status, &body.to_string())
    }

    /// Answer `path` with `status` and a verbatim body
    pub fn reply_raw(self, path: &str, status: u16, body: &str) -> Self {
        self.insert(path, status, body, None)
    }

    /// Answer `path` only after `delay`
    pub fn reply_after(self, path: &str, delay: Duration, body: Value) -> Self {
        self.insert(path, 200, &body.to_string(), Some(delay))
    }

    fn insert(self, path: &str, status: u16, body: &str, delay: Option<Duration>) -> Self {
        self.replies.lock().unwrap().insert(
            path.to_string(),
            Reply {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    /// Requests received so far
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    /// Bind to an ephemeral port and return the API base address
    pub async fn start(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }
}

async fn handle(
    State(stub): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    stub.received.lock().unwrap().push(Received {
        method: method.to_string(),
        path: path.clone(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let reply = stub.replies.lock().unwrap().get(&path).cloned();
    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            (
                reply.status,
                [(header::CONTENT_TYPE, "application/json")],
                reply.body,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "no stub route").into_response(),
    }
}
