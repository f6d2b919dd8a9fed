//! The adapter between the async server and a synchronous application.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::backtrace::Backtrace;
use std::sync::Arc;

use crate::adapter::environment::Environment;
use crate::adapter::error::{failure_response, AdapterError};
use crate::adapter::response::{wrap, Triple};
use crate::error::{error_trace, BoxError};
use crate::http::handler::Handler;
use crate::http::request::request_id;

/// A synchronous application using the environment calling convention.
///
/// Runs on the blocking pool, so it may block while reading the body.
pub trait Application: Send + Sync + 'static {
    fn call(&self, env: &mut Environment) -> Result<Triple, BoxError>;
}

impl<F> Application for F
where
    F: Fn(&mut Environment) -> Result<Triple, BoxError> + Send + Sync + 'static,
{
    fn call(&self, env: &mut Environment) -> Result<Triple, BoxError> {
        self(env)
    }
}

/// Serves an [`Application`] as a [`Handler`].
pub struct Adapter<A> {
    app: Arc<A>,
}

impl<A: Application> Adapter<A> {
    pub fn new(app: A) -> Self {
        Self { app: Arc::new(app) }
    }

    async fn respond(&self, request: Request<Body>) -> Result<Response<Body>, AdapterError> {
        let mut env = Environment::build(request);
        let app = Arc::clone(&self.app);

        // The environment moves into the blocking task and is dropped there.
        let triple = tokio::task::spawn_blocking(move || app.call(&mut env))
            .await
            .map_err(AdapterError::from_join)?
            .map_err(AdapterError::Application)?;

        tracing::debug!(
            status = triple.status,
            headers = ?triple.headers,
            body = ?triple.body,
            "Application response"
        );
        wrap(triple)
    }
}

#[async_trait]
impl<A: Application> Handler for Adapter<A> {
    async fn call(&self, request: Request<Body>) -> Response<Body> {
        let request_id = request_id(&request).to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.respond(request).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    "Request handled by application"
                );
                response
            }
            Err(error) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error.kind = error.kind(),
                    error.message = %error,
                    error.trace = %error_trace(&error),
                    error.backtrace = %Backtrace::capture(),
                    "Application failed"
                );
                failure_response(&error)
            }
        }
    }
}
