//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rackgate_proxied_requests_total` (counter): requests forwarded, by
//!   endpoint and status
//! - `rackgate_proxy_duration_seconds` (histogram): forwarding latency up
//!   to response headers
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter only runs when enabled in configuration

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::proxy::endpoint::Endpoint;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one forwarded request.
pub fn record_proxied(endpoint: &Endpoint, status: u16, start: Instant) {
    let endpoint = endpoint.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "rackgate_proxied_requests_total",
        "endpoint" => endpoint.clone(),
        "status" => status
    )
    .increment(1);
    ::metrics::histogram!("rackgate_proxy_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}
