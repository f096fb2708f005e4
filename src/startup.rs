//! Application startup and server initialization.
//!
//! This module declares the metrics, builds the shared state and serves
//! the exporter routes.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;

/// Builds the shared state: declares and registers every metric.
///
/// # Panics
///
/// Panics if the metric declarations are inconsistent.
pub fn build_state(config: Arc<ConfigV1>) -> AppState {
    AppState {
        config,
        metrics: Metrics::new(),
    }
}

/// Initializes and runs the metrics server.
///
/// Binds to the address specified in the configuration and serves
/// `/metrics`, `/metrics/snapshot` and `/health` until the process exits.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let bind_address = state.config.bind_address.clone();
    info!("Starting metrics server on {}", bind_address);

    let app = routes::create_router(state);
    let listener = TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
