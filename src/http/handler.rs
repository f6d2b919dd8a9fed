//! The request handler seam.
//!
//! Every stage of the chain (request logging, proxy, adapter) is a
//! [`Handler`]; stages wrap the next one and can fall through to it.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::sync::Arc;

/// An asynchronous `call(request) -> response` entry point.
///
/// Implementations never fail: every error is converted into a response.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request.
    async fn call(&self, request: Request<Body>) -> Response<Body>;

    /// Release long-lived resources. Called once at shutdown.
    async fn close(&self) {}
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, request: Request<Body>) -> Response<Body> {
        (**self).call(request).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn call(&self, request: Request<Body>) -> Response<Body> {
        (**self).call(request).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

/// Answers every request with `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadRequest;

#[async_trait]
impl Handler for BadRequest {
    async fn call(&self, _request: Request<Body>) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::BAD_REQUEST;
        response
    }
}
