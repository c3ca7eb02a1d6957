//! HTTP metrics server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tracing::info;

/// HTTP metrics server
pub struct MetricsServer {
    addr: SocketAddr,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn router() -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
    }

    /// Serve `/metrics` and `/health` until the task is dropped
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Starting metrics server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, Self::router()).await?;

        Ok(())
    }
}

/// Metrics endpoint handler
async fn metrics_handler() -> Response {
    match crate::exporter::export_metrics() {
        Ok(metrics) => (StatusCode::OK, metrics).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error exporting metrics: {}", e),
        )
            .into_response(),
    }
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
