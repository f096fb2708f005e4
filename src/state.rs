//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the loaded configuration and the metrics the exporter reads.

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are cheap reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Metrics declared at startup, recorded by the service and read by `/metrics`.
    pub metrics: Metrics,
}
