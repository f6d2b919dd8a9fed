//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into the handler chain
//!   `Verbose → Proxy → fallback`
//! - Own the endpoint pool and hand it to the proxy
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal

use std::sync::Arc;

use crate::adapter::{Adapter, EchoEnvironment};
use crate::config::{Fallback, GatewayConfig};
use crate::http::handler::{BadRequest, Handler};
use crate::http::verbose::Verbose;
use crate::proxy::dispatcher::Proxy;
use crate::proxy::endpoint::EndpointError;

/// Build the request handler chain described by `config`.
pub fn build_handler(config: &GatewayConfig) -> Result<Arc<dyn Handler>, EndpointError> {
    let fallback: Box<dyn Handler> = match config.proxy.fallback {
        Fallback::BadRequest => Box::new(BadRequest),
        Fallback::Echo => Box::new(Adapter::new(EchoEnvironment)),
    };

    let router = config.host_router()?;
    tracing::info!(
        hosts = router.len(),
        fallback = ?config.proxy.fallback,
        "Routing table built"
    );

    let proxy = Proxy::new(fallback, router, config.endpoint_pool())
        .with_identifier(config.proxy.identifier.clone());

    Ok(Arc::new(Verbose::new(proxy)))
}
