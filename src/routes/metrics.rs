//! Metrics exposition endpoints.

use crate::metrics::MetricSnapshot;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use tracing::error;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Creates the metrics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/metrics/snapshot", get(snapshot_handler))
}

/// Handler for the /metrics endpoint.
///
/// Returns all collected metrics in Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let metrics_text = state.metrics.render().map_err(|e| {
        error!("Failed to render metrics: {}", e);
        HTTPError::internal(format!("failed to render metrics: {}", e))
    })?;

    Ok((
        StatusCode::OK,
        [("Content-Type", PROMETHEUS_CONTENT_TYPE)],
        metrics_text,
    ))
}

/// Handler for the /metrics/snapshot endpoint: the same data as JSON.
async fn snapshot_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<MetricSnapshot>>, HTTPError> {
    let snapshot = state.metrics.snapshot().map_err(|e| {
        error!("Failed to snapshot metrics: {}", e);
        HTTPError::internal(format!("failed to snapshot metrics: {}", e))
    })?;
    Ok(Json(snapshot))
}
