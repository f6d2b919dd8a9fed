//! Request inspection helpers shared by the adapter and the proxy.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Resolve the request authority (URI authority, else `host` header)
//! - Render the protocol version as a string
//! - Expose the peer address carried in request extensions
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Missing values resolve to `None`, never to an error

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Request, Version};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for every inbound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Read the request ID header, if the request carries one.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// The peer that sent a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAddress {
    /// An IP peer.
    Ip(SocketAddr),
    /// A local (Unix domain) peer, possibly unnamed.
    Unix(Option<PathBuf>),
}

impl RemoteAddress {
    /// The peer IP, when the peer is an IP endpoint.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            RemoteAddress::Ip(addr) => Some(addr.ip()),
            RemoteAddress::Unix(_) => None,
        }
    }
}

/// Resolve the peer address of a request.
///
/// An explicit [`RemoteAddress`] extension wins over axum's `ConnectInfo`.
pub fn remote_address<B>(request: &Request<B>) -> Option<RemoteAddress> {
    if let Some(addr) = request.extensions().get::<RemoteAddress>() {
        return Some(addr.clone());
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| RemoteAddress::Ip(*addr))
}

/// The request authority (`host[:port]`).
///
/// HTTP/2 and absolute-form requests carry it in the URI; HTTP/1.1
/// origin-form requests only have the `host` header.
pub fn authority<B>(request: &Request<B>) -> Option<String> {
    if let Some(authority) = request.uri().authority() {
        return Some(authority.as_str().to_string());
    }
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Render a protocol version the way it appears on the request line.
pub fn version_string(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

/// The request path including the query component, as sent by the client.
pub fn path_and_query<B>(request: &Request<B>) -> &str {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}
