//! Proxy failures and the `502 Bad Gateway` they map to.

use axum::body::Body;
use axum::http::header::InvalidHeaderValue;
use axum::http::uri::{InvalidUri, InvalidUriParts};
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::error::error_trace;
use crate::proxy::endpoint::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUriParts),

    #[error("invalid upstream authority: {0}")]
    Authority(#[from] InvalidUri),

    #[error("invalid forwarding header: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("client for {0} is closed")]
    Closed(Endpoint),
}

impl ProxyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Uri(_) | ProxyError::Authority(_) => "InvalidUri",
            ProxyError::Header(_) => "InvalidHeader",
            ProxyError::Upstream(_) => "UpstreamError",
            ProxyError::Closed(_) => "ClientClosed",
        }
    }
}

/// The response sent when forwarding fails: `502`, plain text, naming the
/// failure and its causes.
pub fn bad_gateway(error: &ProxyError) -> Response<Body> {
    let mut body = format!("{}: {}", error.kind(), error);
    let trace = error_trace(error);
    if !trace.is_empty() {
        body.push('\n');
        body.push_str(&trace);
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain"),
    );
    response
}
