use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tokio::net::TcpListener;

use crate::metrics::{exposition, MetricsCollector, MetricsSnapshot};

/// Port the scrape endpoint listens on in pull mode.
pub const METRICS_PORT: u16 = 3000;

/// Builds the scrape router. `/metrics` is the canonical path, but every
/// other path answers the exposition too (the original client served
/// metrics on every request); `/metrics.json` is the one exception.
pub fn create_router(metrics: Arc<MetricsCollector>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/metrics.json", get(snapshot_json))
        .fallback(scrape)
        .with_state(metrics)
}

/// Binds the router to the listener and serves until the process exits.
pub async fn serve(listener: TcpListener, metrics: Arc<MetricsCollector>) -> std::io::Result<()> {
    axum::serve(listener, create_router(metrics)).await
}

// ─── Handlers ────────────────────────────────────────────────────

/// Text exposition for Prometheus scrapers. Read-only: serving a scrape
/// never mutates collector state.
async fn scrape(State(metrics): State<Arc<MetricsCollector>>) -> String {
    exposition::render(&metrics.snapshot())
}

/// JSON snapshot — useful for curl / debugging.
async fn snapshot_json(State(metrics): State<Arc<MetricsCollector>>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
