//! Shared outbound HTTP connection
//!
//! The bridge owns exactly one `reqwest::Client` (and therefore one
//! connection pool) for the whole process. It is built lazily on first use,
//! handed out by cheap clone afterwards, and released once at shutdown.
//! After release the holder stays closed: a second client is never built.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

enum Slot {
    Vacant,
    Ready(reqwest::Client),
    Released,
}

/// Lazily-initialized, release-once holder for the shared HTTP client
pub struct SharedConnection {
    timeout: Duration,
    slot: RwLock<Slot>,
    created: AtomicUsize,
}

impl SharedConnection {
    /// Create an empty holder; no client is built until [`acquire`](Self::acquire).
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            slot: RwLock::new(Slot::Vacant),
            created: AtomicUsize::new(0),
        }
    }

    /// Return the shared client, building it if this is the first call.
    ///
    /// Concurrent first callers serialize on the write lock and re-check the
    /// slot, so only one client is ever installed.
    pub async fn acquire(&self) -> Result<reqwest::Client> {
        {
            let slot = self.slot.read().await;
            match &*slot {
                Slot::Ready(client) => return Ok(client.clone()),
                Slot::Released => return Err(Error::Closed),
                Slot::Vacant => {}
            }
        }

        let mut slot = self.slot.write().await;
        match &*slot {
            Slot::Ready(client) => Ok(client.clone()),
            Slot::Released => Err(Error::Closed),
            Slot::Vacant => {
                let client = self.build_client()?;
                self.created.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Created shared HTTP client (timeout {:?})", self.timeout);
                *slot = Slot::Ready(client.clone());
                Ok(client)
            }
        }
    }

    /// Release the shared client.
    ///
    /// Returns `true` if a live client was dropped. Calling this again, or
    /// before any client was built, is a no-op that returns `false`.
    pub async fn release(&self) -> bool {
        let mut slot = self.slot.write().await;
        match std::mem::replace(&mut *slot, Slot::Released) {
            Slot::Ready(_) => {
                tracing::info!("Released shared HTTP client");
                true
            }
            Slot::Vacant | Slot::Released => false,
        }
    }

    /// Whether a client is currently installed
    pub async fn is_established(&self) -> bool {
        matches!(&*self.slot.read().await, Slot::Ready(_))
    }

    /// Whether [`release`](Self::release) has run
    pub async fn is_released(&self) -> bool {
        matches!(&*self.slot.read().await, Slot::Released)
    }

    /// Number of clients built over this holder's lifetime (0 or 1)
    pub fn connections_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Configured per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .user_agent(concat!("archon-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

impl std::fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedConnection")
            .field("timeout", &self.timeout)
            .field("created", &self.connections_created())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn holder() -> SharedConnection {
        SharedConnection::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_lazy_creation() {
        let conn = holder();
        assert!(!conn.is_established().await);
        assert_eq!(conn.connections_created(), 0);

        conn.acquire().await.unwrap();
        assert!(conn.is_established().await);
        assert_eq!(conn.connections_created(), 1);
    }

    #[tokio::test]
    async fn test_sequential_acquire_reuses_client() {
        let conn = holder();
        conn.acquire().await.unwrap();
        conn.acquire().await.unwrap();
        conn.acquire().await.unwrap();
        assert_eq!(conn.connections_created(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_creates_once() {
        let conn = Arc::new(holder());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let conn = Arc::clone(&conn);
            handles.push(tokio::spawn(async move { conn.acquire().await.is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(conn.connections_created(), 1);
    }

    #[tokio::test]
    async fn test_release_without_client_is_noop() {
        let conn = holder();
        assert!(!conn.release().await);
        assert!(conn.is_released().await);
        assert_eq!(conn.connections_created(), 0);
    }

    #[tokio::test]
    async fn test_release_twice() {
        let conn = holder();
        conn.acquire().await.unwrap();
        assert!(conn.release().await);
        assert!(!conn.release().await);
        assert!(!conn.is_established().await);
    }

    #[tokio::test]
    async fn test_no_recreation_after_release() {
        let conn = holder();
        conn.acquire().await.unwrap();
        conn.release().await;

        let err = conn.acquire().await.unwrap_err();
        assert!(matches!(err, Error::Closed));
        assert_eq!(conn.connections_created(), 1);
    }
}
