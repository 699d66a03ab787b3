//! HTTP surface
//!
//! ## Endpoints
//!
//! - `ANY /health` - Plain-text liveness check, never touches upstream
//! - `ANY /metrics` - The loaded metric document
//! - `ANY /execute?limit=&skip=` - Start a run in the background and echo the window
//!
//! Any other path answers 404 with an empty body.

pub mod routes;
pub mod state;
pub mod types;

pub use state::ApiState;
pub use types::ExecuteResponse;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::any,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8787")
    pub bind_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
        }
    }
}

/// Build the router with all routes
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", any(routes::health::health_check))
        .route("/metrics", any(routes::metrics::get_metrics))
        .route("/execute", any(routes::execute::execute))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// A running API server
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Stop accepting connections and wait for open requests to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("API server task failed: {e}");
        }
    }
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns once the listener is bound.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<ApiServer> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("API server error: {}", e);
        }
    });

    Ok(ApiServer {
        addr,
        shutdown_tx,
        task,
    })
}
