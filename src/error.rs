//! Shared error plumbing.

use std::error::Error;

/// A type-erased error returned by applications and body producers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Render an error's source chain, one cause per line.
///
/// Logged next to the error itself wherever a failure is converted into a
/// response.
pub fn error_trace(error: &(dyn Error + 'static)) -> String {
    let mut trace = String::new();
    let mut source = error.source();
    while let Some(cause) = source {
        if !trace.is_empty() {
            trace.push_str("\n\t");
        }
        trace.push_str("caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}
