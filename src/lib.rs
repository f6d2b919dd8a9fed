//! Name-based reverse proxy and synchronous application adapter.
//!
//! - [`adapter`]: turns a streamed request into an [`adapter::Environment`]
//!   for a synchronous [`adapter::Application`] and its returned triple
//!   back into a streamed response
//! - [`proxy`]: routes requests by virtual host to pooled backend clients
//! - [`http`]: the [`http::Handler`] seam, request logging and the server

pub mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::GatewayConfig;
pub use error::BoxError;
pub use http::{Handler, HttpServer};
pub use lifecycle::Shutdown;
