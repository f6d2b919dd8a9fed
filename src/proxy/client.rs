//! Outbound HTTP client bound to one endpoint.

use axum::body::Body;
use axum::http::uri::{PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::proxy::endpoint::Endpoint;
use crate::proxy::error::ProxyError;

/// Settings applied to every pooled client.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub connect_timeout: Option<Duration>,
}

/// A long-lived client for one backend; keeps its connections alive
/// across requests.
#[derive(Debug)]
pub struct EndpointClient {
    endpoint: Endpoint,
    client: Client<HttpConnector, Body>,
    closed: AtomicBool,
}

impl EndpointClient {
    pub fn new(endpoint: Endpoint, options: &ClientOptions) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(options.connect_timeout);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            endpoint,
            client,
            closed: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send `request` to the endpoint, streaming both bodies.
    ///
    /// Method, path, query and headers are kept; the URI is re-targeted at
    /// the endpoint and the original authority stays in `host`.
    pub async fn call(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        if self.is_closed() {
            return Err(ProxyError::Closed(self.endpoint.clone()));
        }

        let (mut parts, body) = request.into_parts();

        if !parts.headers.contains_key(header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                    parts.headers.insert(header::HOST, value);
                }
            }
        }

        let mut uri_parts = parts.uri.into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.endpoint.authority().parse()?);
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts)?;
        // Pooled connections speak HTTP/1.1 regardless of the inbound protocol.
        parts.version = Version::HTTP_11;

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Stop accepting requests. Idle connections close when the last
    /// reference to the client is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(endpoint = %self.endpoint, "Closing endpoint client");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
