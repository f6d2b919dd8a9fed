//! Translation of an application's `(status, headers, body)` triple into a
//! streamed server response.
//!
//! # Design Decisions
//! - Chunk iterators are pulled one chunk per poll on the blocking pool,
//!   so the application produces data only as fast as the client reads
//! - A header value containing `\n` is sent as one header line per value
//! - `rack.*` response headers are internal to the convention and dropped

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Response, StatusCode};
use bytes::Bytes;
use futures_util::stream;

use crate::adapter::error::AdapterError;
use crate::error::{error_trace, BoxError};

/// A lazily produced sequence of body chunks.
pub type Chunks = Box<dyn Iterator<Item = Result<Bytes, BoxError>> + Send>;

/// The body half of an application response.
pub enum ResponseBody {
    Empty,
    Full(Bytes),
    /// Produced chunk by chunk as the server drains the response.
    Chunks(Chunks),
    /// Already a streamed body (e.g. a proxied response).
    Stream(Body),
}

impl ResponseBody {
    /// A body from infallible chunks.
    pub fn iter<I, T>(chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Into<Bytes>,
    {
        ResponseBody::Chunks(Box::new(chunks.into_iter().map(|c| Ok(c.into()))))
    }

    /// A body from chunks that may fail part way through.
    pub fn try_iter<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<Bytes, BoxError>>,
        I::IntoIter: Send + 'static,
    {
        ResponseBody::Chunks(Box::new(chunks.into_iter()))
    }

    fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Empty => "empty",
            ResponseBody::Full(_) => "full",
            ResponseBody::Chunks(_) => "chunks",
            ResponseBody::Stream(_) => "stream",
        }
    }

    fn into_body(self) -> Body {
        match self {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Full(bytes) => Body::from(bytes),
            ResponseBody::Chunks(chunks) => stream_chunks(chunks),
            ResponseBody::Stream(body) => body,
        }
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResponseBody::{}", self.kind())
    }
}

impl From<&'static str> for ResponseBody {
    fn from(s: &'static str) -> Self {
        ResponseBody::Full(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for ResponseBody {
    fn from(s: String) -> Self {
        ResponseBody::Full(Bytes::from(s))
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(v: Vec<u8>) -> Self {
        ResponseBody::Full(Bytes::from(v))
    }
}

impl From<Bytes> for ResponseBody {
    fn from(b: Bytes) -> Self {
        ResponseBody::Full(b)
    }
}

impl From<Body> for ResponseBody {
    fn from(b: Body) -> Self {
        ResponseBody::Stream(b)
    }
}

/// What an application returns.
#[derive(Debug)]
pub struct Triple {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl Triple {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<ResponseBody>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Wrap a triple into a streamed response without draining its body.
pub fn wrap(triple: Triple) -> Result<Response<Body>, AdapterError> {
    let status = StatusCode::from_u16(triple.status)
        .map_err(|_| AdapterError::InvalidResponse(format!("invalid status {}", triple.status)))?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &triple.headers {
        if name.starts_with("rack.") {
            continue;
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AdapterError::InvalidResponse(format!("invalid header name {name:?}")))?;
        for line in value.split('\n') {
            let value = HeaderValue::from_str(line).map_err(|_| {
                AdapterError::InvalidResponse(format!("invalid value for header {name}"))
            })?;
            headers.append(name.clone(), value);
        }
    }

    *response.body_mut() = triple.body.into_body();
    Ok(response)
}

fn stream_chunks(chunks: Chunks) -> Body {
    let chunks = stream::unfold(Some(chunks), |state| async move {
        let Some(mut chunks) = state else {
            return None;
        };
        let pulled = tokio::task::spawn_blocking(move || {
            let next = chunks.next();
            (chunks, next)
        })
        .await;

        match pulled {
            Ok((chunks, Some(Ok(bytes)))) => Some((Ok(bytes), Some(chunks))),
            Ok((_, Some(Err(error)))) => {
                tracing::error!(
                    error.kind = "BodyError",
                    error.message = %error,
                    error.trace = %error_trace(&*error),
                    "Response body failed while streaming"
                );
                Some((Err(error), None))
            }
            Ok((_, None)) => None,
            Err(join) => {
                let error = AdapterError::from_join(join);
                tracing::error!(
                    error.kind = error.kind(),
                    error.message = %error,
                    "Response body failed while streaming"
                );
                Some((Err(BoxError::from(error)), None))
            }
        }
    });
    Body::from_stream(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn status_headers_and_body_are_translated() {
        let triple = Triple::new(
            201,
            vec![
                ("content-type".into(), "text/plain".into()),
                ("set-cookie".into(), "a=1\nb=2".into()),
                ("rack.hijack".into(), "ignored".into()),
            ],
            ResponseBody::iter(vec!["hello, ", "world"]),
        );
        let response = wrap(triple).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert!(response.headers().get("rack.hijack").is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello, world");
    }

    #[tokio::test]
    async fn chunks_are_not_pulled_before_the_body_is_polled() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let chunks = (0..3).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(i.to_string()))
        });
        let response = wrap(Triple::new(200, vec![], ResponseBody::try_iter(chunks))).unwrap();
        assert_eq!(pulled.load(Ordering::SeqCst), 0);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"012");
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failing_chunk_aborts_the_body() {
        let chunks = vec![Ok(Bytes::from_static(b"partial")), Err(BoxError::from("disk gone"))];
        let response = wrap(Triple::new(200, vec![], ResponseBody::try_iter(chunks))).unwrap();
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[test]
    fn invalid_status_is_rejected() {
        let err = wrap(Triple::new(42, vec![], ResponseBody::Empty)).unwrap_err();
        assert_eq!(err.kind(), "InvalidResponse");
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let triple = Triple::new(200, vec![("bad header".into(), "x".into())], "");
        assert!(matches!(wrap(triple), Err(AdapterError::InvalidResponse(_))));
    }
}
