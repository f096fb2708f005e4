//! Metrics collection and exposition for Prometheus.
//!
//! Metrics are declared once on a [`MetricsRegistry`] at startup, updated
//! through the [`MetricsRecorder`] trait, and read back by the exporter as
//! snapshots or Prometheus text.

mod definition;
mod error;
mod handle;
mod recorder;
mod registry;
mod snapshot;

pub use definition::{MetricDefinition, MetricIdentity, MetricKind, NAMESPACE, SUBSYSTEM};
pub use error::MetricsError;
pub use handle::MetricHandle;
pub use recorder::{
    Metrics, MetricsRecorder, default_timing_buckets, errors_definition, http_results_definition,
    timings_definition,
};
pub use registry::MetricsRegistry;
pub use snapshot::{BucketCount, MetricSnapshot, SeriesSnapshot, SeriesValue};
