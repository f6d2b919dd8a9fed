//! Per-request summary logging.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body::Body as _;
use std::time::Instant;

use crate::http::handler::Handler;
use crate::http::request::{path_and_query, remote_address, request_id, version_string};

/// Logs `METHOD path VERSION -> status` for every request it passes on.
pub struct Verbose<H> {
    inner: H,
}

impl<H: Handler> Verbose<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: Handler> Handler for Verbose<H> {
    async fn call(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let request_id = request_id(&request).to_string();
        let method = request.method().clone();
        let target = path_and_query(&request).to_string();
        let version = version_string(request.version());
        let peer = remote_address(&request);

        let response = self.inner.call(request).await;

        tracing::info!(
            request_id = %request_id,
            peer = ?peer,
            content_length = response.body().size_hint().exact(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "{method} {target} {version} -> {}",
            response.status().as_u16()
        );
        response
    }

    async fn close(&self) {
        self.inner.close().await
    }
}
