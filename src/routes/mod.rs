//! HTTP route definitions and handlers.
//!
//! The service only exposes what a pull-based collector needs:
//! the metrics themselves and a health check.

mod health_routes;
pub mod metrics;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router and attaches
/// the application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
