//! Adapter between the async server and synchronous applications.
//!
//! # Data Flow
//! ```text
//! Request<Body> (streamed)
//!     → environment.rs (path/query, host/port, metadata keys)
//!         → headers.rs (fold repeated headers into HTTP_* keys)
//!         → input.rs (body as a blocking reader)
//!         → hijack.rs (one-shot connection takeover)
//!     → Application::call on the blocking pool (rack.rs)
//!     → response.rs (triple → streamed Response<Body>)
//!     → error.rs (any failure → 500 response)
//! ```
//!
//! # Design Decisions
//! - The environment is a closed struct, not an open string map
//! - No body is ever buffered in full on either side
//! - `Adapter::call` never fails; failures are logged and answered

pub mod echo;
pub mod environment;
pub mod error;
pub mod headers;
pub mod hijack;
pub mod input;
pub mod rack;
pub mod response;

pub use echo::EchoEnvironment;
pub use environment::Environment;
pub use error::{failure_response, AdapterError};
pub use hijack::{Hijack, HijackedIo};
pub use input::Input;
pub use rack::{Adapter, Application};
pub use response::{ResponseBody, Triple};
