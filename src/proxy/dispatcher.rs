//! Name-based reverse proxy entry point.
//!
//! # Request State Machine
//! ```text
//! lookup(authority)
//!     ├─ no match → next handler (response returned unchanged)
//!     └─ match    → count += 1
//!                 → append x-forwarded-for (IP peers only), via
//!                 → strip hop-by-hop headers
//!                 → pool.connect(endpoint) → client.call(request)
//!                 → any failure → 502 text/plain
//! ```

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::error_trace;
use crate::http::handler::Handler;
use crate::http::request::{remote_address, request_id, version_string};
use crate::observability::metrics;
use crate::proxy::endpoint::Endpoint;
use crate::proxy::error::{bad_gateway, ProxyError};
use crate::proxy::headers::{append_forwarded_for, append_via, prepare_headers};
use crate::proxy::pool::EndpointPool;
use crate::proxy::router::HostRouter;

/// Token identifying this proxy in `via` headers.
pub const DEFAULT_IDENTIFIER: &str = "rackgate";

/// Forwards requests for registered hosts; everything else goes to `next`.
pub struct Proxy<H> {
    next: H,
    router: HostRouter,
    pool: Arc<EndpointPool>,
    identifier: String,
    count: AtomicU64,
}

impl<H: Handler> Proxy<H> {
    pub fn new(next: H, router: HostRouter, pool: Arc<EndpointPool>) -> Self {
        Self {
            next,
            router,
            pool,
            identifier: DEFAULT_IDENTIFIER.to_string(),
            count: AtomicU64::new(0),
        }
    }

    /// Override the `via` token.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Requests matched to an endpoint so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    async fn forward(
        &self,
        endpoint: &Endpoint,
        mut request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let client_ip = remote_address(&request).and_then(|addr| addr.ip());
        let version = version_string(request.version());

        let headers = request.headers_mut();
        if let Some(ip) = client_ip {
            append_forwarded_for(headers, ip);
        }
        append_via(headers, version, &self.identifier)?;
        prepare_headers(headers);

        let client = self.pool.connect(endpoint)?;
        client.call(request).await
    }
}

#[async_trait]
impl<H: Handler> Handler for Proxy<H> {
    async fn call(&self, request: Request<Body>) -> Response<Body> {
        let Some(endpoint) = self.router.lookup(&request).cloned() else {
            return self.next.call(request).await;
        };

        self.count.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let request_id = request_id(&request).to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            endpoint = %endpoint,
            "Proxying request"
        );

        match self.forward(&endpoint, request).await {
            Ok(response) => {
                metrics::record_proxied(&endpoint, response.status().as_u16(), start);
                response
            }
            Err(error) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    endpoint = %endpoint,
                    error.kind = error.kind(),
                    error.message = %error,
                    error.trace = %error_trace(&error),
                    error.backtrace = %Backtrace::capture(),
                    "Upstream error"
                );
                metrics::record_proxied(&endpoint, 502, start);
                bad_gateway(&error)
            }
        }
    }

    async fn close(&self) {
        self.pool.close();
        self.next.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::BadRequest;
    use crate::observability::logging::capture::capture_logs;
    use axum::http::StatusCode;

    fn proxy(router: HostRouter) -> Proxy<BadRequest> {
        Proxy::new(BadRequest, router, Arc::new(EndpointPool::default()))
    }

    #[tokio::test]
    async fn unmatched_requests_fall_through_without_counting() {
        let proxy = proxy(HostRouter::new());
        let req = Request::builder()
            .uri("/foo?bar=1")
            .header("host", "api.example.com")
            .body(Body::empty())
            .unwrap();

        let res = proxy.call(req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(proxy.count(), 0);
        assert!(proxy.pool().is_empty());
    }

    #[tokio::test]
    async fn closed_pool_yields_502() {
        let mut router = HostRouter::new();
        router.insert("api.example.com", Endpoint::new("127.0.0.1", 9));
        let proxy = proxy(router);
        proxy.close().await;

        let req = Request::builder()
            .uri("/foo")
            .header("host", "api.example.com")
            .body(Body::empty())
            .unwrap();
        let res = proxy.call(req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(proxy.count(), 1);
    }

    #[tokio::test]
    async fn invalid_identifier_yields_502() {
        let mut router = HostRouter::new();
        router.insert("api.example.com", Endpoint::new("127.0.0.1", 9));
        let proxy = proxy(router).with_identifier("bad\nidentifier");

        let req = Request::builder()
            .uri("/")
            .header("host", "api.example.com")
            .body(Body::empty())
            .unwrap();
        let res = proxy.call(req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).starts_with("InvalidHeader:"));
    }

    #[tokio::test]
    async fn upstream_failures_are_logged() {
        let (_guard, logs) = capture_logs();
        let mut router = HostRouter::new();
        router.insert("down.example.com", Endpoint::new("127.0.0.1", 1));
        let proxy = proxy(router);

        let req = Request::builder()
            .uri("/")
            .header("host", "down.example.com")
            .body(Body::empty())
            .unwrap();
        let res = proxy.call(req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let output = logs.contents();
        assert!(output.contains("Upstream error"), "{output}");
        assert!(output.contains("UpstreamError"), "{output}");
        assert!(output.contains("upstream request failed"), "{output}");
        assert!(output.contains("error.backtrace"), "{output}");
    }
}
