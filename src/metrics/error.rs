use thiserror::Error;

use super::definition::MetricIdentity;

/// Everything that can go wrong while declaring, recording or exporting metrics.
///
/// Declaration variants are startup defects and are treated as fatal by
/// [`super::Metrics::new`]. `LabelMismatch` and `KindMismatch` never leave the
/// recorder. Export variants are handed to the transport.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric {0} is already declared")]
    DuplicateMetric(MetricIdentity),

    #[error("invalid buckets for histogram {identity}: {reason}")]
    InvalidBuckets {
        identity: MetricIdentity,
        reason: String,
    },

    #[error("invalid labels for metric {identity}: {reason}")]
    InvalidLabels {
        identity: MetricIdentity,
        reason: String,
    },

    #[error("metrics have already been registered with the exporter")]
    AlreadyRegistered,

    #[error("metric {0} declared after registration")]
    DeclaredAfterRegistration(MetricIdentity),

    #[error("metrics have not been registered with the exporter yet")]
    NotRegistered,

    #[error("label set {given:?} does not match schema {expected:?} of metric {identity}")]
    LabelMismatch {
        identity: MetricIdentity,
        expected: Vec<String>,
        given: Vec<String>,
    },

    #[error("metric {identity} is a {actual}, cannot {operation}")]
    KindMismatch {
        identity: MetricIdentity,
        actual: &'static str,
        operation: &'static str,
    },

    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics encoding produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
