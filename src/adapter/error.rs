//! Adapter failures and their single mapping to a response.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use tokio::task::JoinError;

use crate::error::BoxError;

/// Everything that can go wrong between receiving a request and handing
/// a streamed response back to the server.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The application returned an error.
    #[error("{0}")]
    Application(#[source] BoxError),

    /// The application panicked.
    #[error("{0}")]
    Panic(String),

    /// The application returned a status or header the server cannot send.
    #[error("{0}")]
    InvalidResponse(String),

    /// The blocking task running the application was cancelled.
    #[error("application task cancelled")]
    Cancelled,
}

impl AdapterError {
    /// Convert the outcome of a failed blocking task.
    pub fn from_join(error: JoinError) -> Self {
        if error.is_panic() {
            AdapterError::Panic(panic_message(error.into_panic()))
        } else {
            AdapterError::Cancelled
        }
    }

    /// A short, stable name for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Application(_) => "ApplicationError",
            AdapterError::Panic(_) => "Panic",
            AdapterError::InvalidResponse(_) => "InvalidResponse",
            AdapterError::Cancelled => "Cancelled",
        }
    }

    /// The status code the failure maps to.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Extract the message from a panic payload.
pub fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Map a failure to the response sent in place of the application's.
///
/// Unknown failures become a plain-text `500 Internal Server Error`
/// naming the failure kind and message.
pub fn failure_response(error: &AdapterError) -> Response<Body> {
    let body = format!("{}: {}", error.kind(), error);
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = error.status();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn application_errors_map_to_500() {
        let error = AdapterError::Application("database is down".into());
        let response = failure_response(&error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ApplicationError: database is down");
    }

    #[tokio::test]
    async fn panics_carry_their_message() {
        let join = tokio::task::spawn_blocking(|| panic!("boom")).await.unwrap_err();
        let error = AdapterError::from_join(join);
        assert_eq!(error.kind(), "Panic");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn formatted_panic_payloads_are_strings() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(format!("bad {}", 1));
        assert_eq!(panic_message(payload), "bad 1");
    }
}
