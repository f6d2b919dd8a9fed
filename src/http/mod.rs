//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → handler.rs (Handler chain)
//!         → verbose.rs (summary log line)
//!         → proxy (host routing) or adapter (application)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod server;
pub mod verbose;

pub use handler::{BadRequest, Handler};
pub use request::{RemoteAddress, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use verbose::Verbose;
