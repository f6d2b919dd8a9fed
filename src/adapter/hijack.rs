//! Connection hijacking.
//!
//! A request whose connection can be upgraded carries hyper's
//! [`OnUpgrade`] handle. The application takes it at most once and then
//! owns the raw duplex stream; nothing here closes it afterwards.

use hyper::upgrade::{OnUpgrade, Upgraded};
use hyper_util::rt::TokioIo;
use std::fmt;

/// The one-shot capability to take over a request's connection.
pub struct Hijack {
    upgrade: OnUpgrade,
}

impl Hijack {
    pub(crate) fn new(upgrade: OnUpgrade) -> Self {
        Self { upgrade }
    }

    /// Detach the connection from the request/response cycle.
    pub fn take(self) -> HijackedIo {
        HijackedIo {
            upgrade: self.upgrade,
        }
    }
}

impl fmt::Debug for Hijack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hijack").finish_non_exhaustive()
    }
}

/// A connection handed over to the application.
///
/// The stream becomes available once the response (typically `101
/// Switching Protocols`) has been written by the server.
pub struct HijackedIo {
    upgrade: OnUpgrade,
}

impl HijackedIo {
    /// Wait for the server to release the connection.
    pub async fn upgraded(self) -> Result<TokioIo<Upgraded>, hyper::Error> {
        self.upgrade.await.map(TokioIo::new)
    }
}

impl fmt::Debug for HijackedIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HijackedIo").finish_non_exhaustive()
    }
}
