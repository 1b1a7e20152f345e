//! HTTP router and shared state.
//!
//! Routes:
//!
//! - `GET /healthz`
//! - `GET /api/cves`, `POST /api/cves`
//! - `DELETE /api/cves/:id`
//! - `PATCH /api/cves/:id/status`

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch};
use cvetrack_core::RemoteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::routes::{cves, health};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
}

impl AppState {
    pub fn new(store: impl RemoteStore + 'static) -> Self {
        Self { store: Arc::new(store) }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/cves", get(cves::list).post(cves::create))
        .route("/api/cves/:id", delete(cves::remove))
        .route("/api/cves/:id/status", patch(cves::update_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on an already bound listener until `shutdown` resolves.
pub async fn run(
    listener: TcpListener, state: AppState, shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "cvetrack API listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
