//! HTTP surfaces: the admin API and the Prometheus metrics endpoint.
//!
//! The admin API trusts that callers were authorized upstream. When
//! admission is enabled every route, the admin API included, sits behind
//! [`admission::admission_middleware`].

pub mod admission;
pub mod blocks;
pub mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::actors::ActorDirectory;
use crate::db::Database;
pub use admission::AdmissionGate;

/// Shared state of the admin API handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub actors: Arc<dyn ActorDirectory>,
    pub sweep_batch_size: u32,
}

/// Build the admin API router, optionally gated by admission.
pub fn router(state: AppState, gate: Option<Arc<AdmissionGate>>) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/blocks",
            get(blocks::list_blocks).post(blocks::create_block),
        )
        .route(
            "/api/v1/blocks/:ip",
            get(blocks::get_block)
                .put(blocks::replace_block)
                .patch(blocks::update_block)
                .delete(blocks::delete_block),
        )
        .route("/api/v1/check/:ip", get(blocks::check_block))
        .route("/api/v1/sweep", post(blocks::sweep))
        .route("/health", get(health_handler))
        .with_state(state);

    match gate {
        Some(gate) => api.layer(middleware::from_fn_with_state(
            gate,
            admission::admission_middleware,
        )),
        None => api,
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Serve the admin API until `shutdown` resolves.
pub async fn run_api_server(
    addr: SocketAddr,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Admin API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Run the HTTP server for Prometheus metrics.
///
/// Binds to `0.0.0.0:port` and serves the `/metrics` endpoint.
/// This is a long-running task that should be spawned in the background.
pub async fn run_metrics_server(port: u16) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prometheus HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
