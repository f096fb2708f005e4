//! Metric declarations: identity, help text, label schema and kind.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::error::MetricsError;

/// Namespace shared by every metric this service declares.
pub const NAMESPACE: &str = "perceptor";
/// Subsystem shared by every metric this service declares.
pub const SUBSYSTEM: &str = "image_perceiver";

/// (namespace, subsystem, name) triple identifying a metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricIdentity {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
}

impl MetricIdentity {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        MetricIdentity {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            name: name.into(),
        }
    }

    /// Identity under the service-wide namespace and subsystem.
    pub fn perceiver(name: impl Into<String>) -> Self {
        Self::new(NAMESPACE, SUBSYSTEM, name)
    }

    /// Fully qualified name as the exporter renders it, empty parts skipped.
    pub fn fq_name(&self) -> String {
        [
            self.namespace.as_str(),
            self.subsystem.as_str(),
            self.name.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fq_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable metric declaration.
///
/// `buckets` is only meaningful for histograms and must then be non-empty,
/// finite and strictly ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub identity: MetricIdentity,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    pub buckets: Vec<f64>,
}

impl MetricDefinition {
    pub fn counter(
        identity: MetricIdentity,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Self {
        MetricDefinition {
            identity,
            help: help.into(),
            kind: MetricKind::Counter,
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
            buckets: Vec::new(),
        }
    }

    pub fn histogram(
        identity: MetricIdentity,
        help: impl Into<String>,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> Self {
        MetricDefinition {
            identity,
            help: help.into(),
            kind: MetricKind::Histogram,
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
            buckets,
        }
    }

    /// Checks the label schema and, for histograms, the bucket boundaries.
    pub fn validate(&self) -> Result<(), MetricsError> {
        self.validate_labels()?;
        match self.kind {
            MetricKind::Counter if !self.buckets.is_empty() => Err(MetricsError::InvalidBuckets {
                identity: self.identity.clone(),
                reason: "counters do not take buckets".to_string(),
            }),
            MetricKind::Counter => Ok(()),
            MetricKind::Histogram => self.validate_buckets(),
        }
    }

    fn validate_labels(&self) -> Result<(), MetricsError> {
        let invalid = |reason: String| MetricsError::InvalidLabels {
            identity: self.identity.clone(),
            reason,
        };

        let mut seen = HashSet::new();
        for label in &self.label_names {
            if !is_valid_label_name(label) {
                return Err(invalid(format!("'{}' is not a valid label name", label)));
            }
            if self.kind == MetricKind::Histogram && label == "le" {
                return Err(invalid("'le' is reserved for histogram buckets".to_string()));
            }
            if !seen.insert(label.as_str()) {
                return Err(invalid(format!("label '{}' is declared twice", label)));
            }
        }
        Ok(())
    }

    fn validate_buckets(&self) -> Result<(), MetricsError> {
        let invalid = |reason: &str| MetricsError::InvalidBuckets {
            identity: self.identity.clone(),
            reason: reason.to_string(),
        };

        if self.buckets.is_empty() {
            return Err(invalid("bucket list is empty"));
        }
        if self.buckets.iter().any(|b| !b.is_finite()) {
            return Err(invalid("bucket boundaries must be finite"));
        }
        if self.buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(invalid("bucket boundaries must be strictly ascending"));
        }
        Ok(())
    }
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well
        && !name.starts_with("__")
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_joins_non_empty_parts() {
        let identity = MetricIdentity::perceiver("timings");
        assert_eq!(identity.fq_name(), "perceptor_image_perceiver_timings");

        let bare = MetricIdentity::new("", "", "errors");
        assert_eq!(bare.fq_name(), "errors");
    }

    #[test]
    fn histogram_with_ascending_buckets_is_valid() {
        let def = MetricDefinition::histogram(
            MetricIdentity::perceiver("timings"),
            "help",
            &["operation"],
            vec![0.25, 0.5, 1.0, 2.0],
        );
        assert!(def.validate().is_ok());
    }

    #[test]
    fn histogram_rejects_empty_buckets() {
        let def =
            MetricDefinition::histogram(MetricIdentity::perceiver("t"), "help", &["op"], vec![]);
        assert!(matches!(
            def.validate(),
            Err(MetricsError::InvalidBuckets { .. })
        ));
    }

    #[test]
    fn histogram_rejects_unsorted_or_repeated_buckets() {
        for buckets in [vec![1.0, 0.5], vec![0.5, 0.5, 1.0], vec![0.5, f64::NAN]] {
            let def = MetricDefinition::histogram(
                MetricIdentity::perceiver("t"),
                "help",
                &["op"],
                buckets.clone(),
            );
            assert!(
                matches!(def.validate(), Err(MetricsError::InvalidBuckets { .. })),
                "buckets {:?} should be rejected",
                buckets
            );
        }
    }

    #[test]
    fn counter_rejects_buckets() {
        let mut def = MetricDefinition::counter(MetricIdentity::perceiver("c"), "help", &["a"]);
        def.buckets = vec![1.0];
        assert!(matches!(
            def.validate(),
            Err(MetricsError::InvalidBuckets { .. })
        ));
    }

    #[test]
    fn label_schema_is_checked() {
        let cases: [&[&str]; 4] = [&["stage", "stage"], &["1stage"], &["__reserved"], &[""]];
        for labels in cases {
            let def = MetricDefinition::counter(MetricIdentity::perceiver("c"), "help", labels);
            assert!(
                matches!(def.validate(), Err(MetricsError::InvalidLabels { .. })),
                "labels {:?} should be rejected",
                labels
            );
        }

        let le = MetricDefinition::histogram(
            MetricIdentity::perceiver("h"),
            "help",
            &["le"],
            vec![1.0],
        );
        assert!(matches!(
            le.validate(),
            Err(MetricsError::InvalidLabels { .. })
        ));
    }

    #[test]
    fn mixed_case_label_names_are_accepted() {
        let def = MetricDefinition::counter(
            MetricIdentity::perceiver("errors"),
            "help",
            &["stage", "errorName"],
        );
        assert!(def.validate().is_ok());
    }
}
