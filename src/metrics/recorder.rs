//! Metrics recording implementation using Prometheus.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::definition::{MetricDefinition, MetricIdentity};
use super::error::MetricsError;
use super::handle::MetricHandle;
use super::registry::MetricsRegistry;
use super::snapshot::MetricSnapshot;
use crate::utils::log_throttle::LogThrottle;

/// How often a dropped-observation warning may repeat for the same metric.
const DROP_WARNING_INTERVAL: Duration = Duration::from_secs(60);

/// Trait for recording image perceiver metrics.
///
/// Recording never fails from the caller's point of view: observations that
/// cannot be applied are logged and dropped.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Counts one error raised at `stage`.
    fn record_error(&self, stage: &str, error_name: &str);

    /// Records how long `operation` took.
    fn record_duration(&self, operation: &str, duration: Duration) {
        self.record_duration_secs(operation, duration.as_secs_f64());
    }

    /// Records how long `operation` took, in seconds. Negative values count as zero.
    fn record_duration_secs(&self, operation: &str, duration_secs: f64);

    /// Counts one HTTP request issued to `path` and whether it succeeded.
    fn record_http_stats(&self, path: &str, success: bool);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<MetricsRegistry>,
    errors: MetricHandle,
    timings: MetricHandle,
    http_results: MetricHandle,
    throttle: Arc<LogThrottle>,
}

/// Upper bounds of the timings histogram: 0.25s doubling over 20 buckets.
pub fn default_timing_buckets() -> Vec<f64> {
    (0..20).map(|i| 0.25 * 2f64.powi(i)).collect()
}

pub fn errors_definition() -> MetricDefinition {
    MetricDefinition::counter(
        MetricIdentity::perceiver("errors"),
        "errors from image perceiver operations",
        &["stage", "errorName"],
    )
}

pub fn timings_definition(buckets: Vec<f64>) -> MetricDefinition {
    MetricDefinition::histogram(
        MetricIdentity::perceiver("timings"),
        "time durations of image perceiver operations",
        &["operation"],
        buckets,
    )
}

pub fn http_results_definition() -> MetricDefinition {
    MetricDefinition::counter(
        MetricIdentity::perceiver("http_response_status_codes"),
        "success/failure responses from HTTP requests issued by image perceiver",
        &["path", "result"],
    )
}

impl Metrics {
    /// Declares and registers the image perceiver metrics on a fresh registry.
    ///
    /// # Panics
    ///
    /// Panics if the declarations are inconsistent. That is a programming
    /// defect and the process must not start with it.
    pub fn new() -> Self {
        Self::try_new().expect("Failed to declare image perceiver metrics")
    }

    pub fn try_new() -> Result<Self, MetricsError> {
        Self::with_timing_buckets(default_timing_buckets())
    }

    /// Same as [`Self::try_new`] with custom upper bounds for the timings histogram.
    pub fn with_timing_buckets(buckets: Vec<f64>) -> Result<Self, MetricsError> {
        let mut registry = MetricsRegistry::new();
        let errors = registry.declare(errors_definition())?;
        let timings = registry.declare(timings_definition(buckets))?;
        let http_results = registry.declare(http_results_definition())?;
        registry.register_all()?;

        Ok(Self::from_handles(registry, errors, timings, http_results))
    }

    /// Wires a recorder onto handles declared elsewhere.
    pub fn from_handles(
        registry: MetricsRegistry,
        errors: MetricHandle,
        timings: MetricHandle,
        http_results: MetricHandle,
    ) -> Self {
        Metrics {
            registry: Arc::new(registry),
            errors,
            timings,
            http_results,
            throttle: Arc::new(LogThrottle::new(DROP_WARNING_INTERVAL)),
        }
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> Result<Vec<MetricSnapshot>, MetricsError> {
        self.registry.snapshot()
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        self.registry.render()
    }

    /// Logs and drops an observation that could not be applied.
    fn absorb(&self, handle: &MetricHandle, result: Result<(), MetricsError>) {
        if let Err(e) = result {
            let metric = handle.identity().fq_name();
            if let Some(suppressed) = self.throttle.should_emit(&metric) {
                warn!(
                    metric = %metric,
                    suppressed,
                    error = %e,
                    "Dropping metric observation"
                );
            }
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Negative or NaN durations are a caller defect; they are recorded as zero.
fn clamp_seconds(operation: &str, duration_secs: f64) -> f64 {
    if duration_secs.is_nan() || duration_secs < 0.0 {
        warn!(operation, duration_secs, "Clamping invalid duration to zero");
        0.0
    } else {
        duration_secs
    }
}

impl MetricsRecorder for Metrics {
    fn record_error(&self, stage: &str, error_name: &str) {
        info!(stage, error_name, "metrics record error");
        let result = self
            .errors
            .inc(&[("stage", stage), ("errorName", error_name)]);
        self.absorb(&self.errors, result);
    }

    fn record_duration_secs(&self, operation: &str, duration_secs: f64) {
        info!(operation, duration_secs, "record duration");
        let seconds = clamp_seconds(operation, duration_secs);
        let result = self.timings.observe(&[("operation", operation)], seconds);
        self.absorb(&self.timings, result);
    }

    fn record_http_stats(&self, path: &str, success: bool) {
        info!(path, success, "record http stats");
        let result = if success { "true" } else { "false" };
        let outcome = self
            .http_results
            .inc(&[("path", path), ("result", result)]);
        self.absorb(&self.http_results, outcome);
    }
}
