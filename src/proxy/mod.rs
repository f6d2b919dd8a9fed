//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (authority, headers)
//!     → router.rs (normalized host → Endpoint, or no match)
//!     → dispatcher.rs (count, forwarding headers)
//!         → headers.rs (x-forwarded-for, via, hop-by-hop stripping)
//!     → pool.rs (one EndpointClient per Endpoint)
//!     → client.rs (forward, stream response back)
//!     → error.rs (failures → 502)
//! ```
//!
//! # Design Decisions
//! - Host table built at startup, immutable at runtime
//! - Pool owned by whoever builds the dispatcher and shared via Arc
//! - No match is not an error: the request falls through to the next
//!   handler

pub mod client;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod pool;
pub mod router;

pub use client::{ClientOptions, EndpointClient};
pub use dispatcher::Proxy;
pub use endpoint::{Endpoint, EndpointError};
pub use error::{bad_gateway, ProxyError};
pub use pool::EndpointPool;
pub use router::HostRouter;
