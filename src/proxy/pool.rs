//! Endpoint client pool.
//!
//! # Responsibilities
//! - Create one client per endpoint on first use
//! - Hand out the same client for every later request to that endpoint
//! - Close every client once, at shutdown
//!
//! # Design Decisions
//! - `DashMap::entry` makes create-or-fetch atomic per key, so concurrent
//!   first requests to one endpoint share a single client
//! - Clients are never evicted while the pool is open

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::proxy::client::{ClientOptions, EndpointClient};
use crate::proxy::endpoint::Endpoint;
use crate::proxy::error::ProxyError;

/// Process-lifetime map of endpoint → pooled client.
#[derive(Debug, Default)]
pub struct EndpointPool {
    clients: DashMap<Endpoint, Arc<EndpointClient>>,
    options: ClientOptions,
    closed: AtomicBool,
}

impl EndpointPool {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            clients: DashMap::new(),
            options,
            closed: AtomicBool::new(false),
        }
    }

    /// Fetch the client for `endpoint`, creating it on first use.
    pub fn connect(&self, endpoint: &Endpoint) -> Result<Arc<EndpointClient>, ProxyError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProxyError::Closed(endpoint.clone()));
        }

        if let Some(client) = self.clients.get(endpoint) {
            return Ok(Arc::clone(client.value()));
        }

        let client = self
            .clients
            .entry(endpoint.clone())
            .or_insert_with(|| {
                tracing::debug!(endpoint = %endpoint, "Creating endpoint client");
                Arc::new(EndpointClient::new(endpoint.clone(), &self.options))
            })
            .value()
            .clone();

        // A close that ran between the flag check and the insert has
        // already drained the map; this client would never be closed.
        if self.closed.load(Ordering::Acquire) {
            client.close();
            self.clients.remove(endpoint);
            return Err(ProxyError::Closed(endpoint.clone()));
        }
        Ok(client)
    }

    /// Number of pooled clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Close and drop every pooled client. Later `connect` calls fail.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for entry in self.clients.iter() {
            entry.value().close();
        }
        let closed = self.clients.len();
        self.clients.clear();
        tracing::info!(clients = closed, "Endpoint pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_endpoint_same_client() {
        let pool = EndpointPool::default();
        let a = pool.connect(&Endpoint::new("backend", 80)).unwrap();
        let b = pool.connect(&Endpoint::parse("http://backend").unwrap()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.endpoint(), &Endpoint::new("backend", 80));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn different_endpoints_different_clients() {
        let pool = EndpointPool::default();
        let a = pool.connect(&Endpoint::new("backend", 80)).unwrap();
        let b = pool.connect(&Endpoint::new("backend", 81)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_creates_one_client() {
        let pool = Arc::new(EndpointPool::default());
        let endpoint = Endpoint::new("shared", 8080);

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let endpoint = endpoint.clone();
                tokio::spawn(async move { pool.connect(&endpoint).unwrap() })
            })
            .collect();

        let mut clients = Vec::new();
        for task in tasks {
            clients.push(task.await.unwrap());
        }
        assert_eq!(pool.len(), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    }

    #[tokio::test]
    async fn close_closes_every_client_once() {
        let pool = EndpointPool::default();
        let a = pool.connect(&Endpoint::new("a", 80)).unwrap();
        let b = pool.connect(&Endpoint::new("b", 80)).unwrap();

        pool.close();
        pool.close();

        assert!(a.is_closed() && b.is_closed());
        assert!(pool.is_empty());
        assert!(matches!(
            pool.connect(&Endpoint::new("a", 80)),
            Err(ProxyError::Closed(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn clients_handed_out_during_close_are_closed() {
        let pool = Arc::new(EndpointPool::default());

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move { pool.connect(&Endpoint::new("racing", 8000 + i)) })
            })
            .collect();
        pool.close();

        for task in tasks {
            if let Ok(client) = task.await.unwrap() {
                assert!(client.is_closed(), "{} left open", client.endpoint());
            }
        }
        assert!(pool.is_empty());
    }
}
