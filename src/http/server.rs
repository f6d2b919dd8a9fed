//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router dispatching every request to the handler chain
//! - Configure HTTP/1.1 and HTTP/2 support (upgrades enabled)
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Close the handler chain once the server has drained

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::handler::Handler;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};

/// Handler chain injected into the router.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn Handler>,
}

/// HTTP server in front of a [`Handler`].
pub struct HttpServer {
    router: Router,
    handler: Arc<dyn Handler>,
}

impl HttpServer {
    /// Create a new HTTP server around `handler`.
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        let state = AppState {
            handler: Arc::clone(&handler),
        };
        Self {
            router: Self::build_router(state),
            handler,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, UuidRequestId))
    }

    /// The router, for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then close the handler chain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        self.handler.close().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Hand every request to the handler chain.
///
/// The peer address travels in the `ConnectInfo` extension.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.handler.call(request).await
}
