//! Health check endpoints.

use crate::state::AppState;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Reports whether the metrics are registered and therefore exportable.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.metrics.registry().is_registered() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "metrics not registered")
    }
}
