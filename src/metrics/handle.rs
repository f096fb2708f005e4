//! Typed handles returned by [`super::MetricsRegistry::declare`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts};

use super::definition::{MetricDefinition, MetricIdentity, MetricKind};
use super::error::MetricsError;

#[derive(Clone)]
enum Aggregate {
    Counter(CounterVec),
    Histogram(HistogramVec),
}

/// A declared metric together with its per-label-set aggregation state.
///
/// Cloning is cheap: clones share the same aggregates. Children are created
/// lazily the first time a label set is seen and are never removed, so the
/// number of series grows with the distinct label values callers supply.
#[derive(Clone)]
pub struct MetricHandle {
    definition: Arc<MetricDefinition>,
    aggregate: Aggregate,
}

impl MetricHandle {
    /// Builds the aggregation state for an already validated definition.
    pub(crate) fn build(definition: MetricDefinition) -> Result<Self, MetricsError> {
        let identity = &definition.identity;
        let labels: Vec<&str> = definition.label_names.iter().map(String::as_str).collect();

        let aggregate = match definition.kind {
            MetricKind::Counter => {
                let opts = Opts::new(identity.name.clone(), definition.help.clone())
                    .namespace(identity.namespace.clone())
                    .subsystem(identity.subsystem.clone());
                Aggregate::Counter(CounterVec::new(opts, &labels)?)
            }
            MetricKind::Histogram => {
                let opts = HistogramOpts::new(identity.name.clone(), definition.help.clone())
                    .namespace(identity.namespace.clone())
                    .subsystem(identity.subsystem.clone())
                    .buckets(definition.buckets.clone());
                Aggregate::Histogram(HistogramVec::new(opts, &labels)?)
            }
        };

        Ok(MetricHandle {
            definition: Arc::new(definition),
            aggregate,
        })
    }

    pub fn definition(&self) -> &MetricDefinition {
        &self.definition
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.definition.identity
    }

    /// Increments the counter for `labels` by one.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<(), MetricsError> {
        let labels = self.resolve(labels)?;
        match &self.aggregate {
            Aggregate::Counter(counter) => {
                counter.get_metric_with(&labels)?.inc();
                Ok(())
            }
            Aggregate::Histogram(_) => Err(self.kind_mismatch("increment")),
        }
    }

    /// Adds `value` to the histogram for `labels`.
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<(), MetricsError> {
        let labels = self.resolve(labels)?;
        match &self.aggregate {
            Aggregate::Histogram(histogram) => {
                histogram.get_metric_with(&labels)?.observe(value);
                Ok(())
            }
            Aggregate::Counter(_) => Err(self.kind_mismatch("observe")),
        }
    }

    pub(crate) fn collector(&self) -> Box<dyn Collector> {
        match &self.aggregate {
            Aggregate::Counter(counter) => Box::new(counter.clone()),
            Aggregate::Histogram(histogram) => Box::new(histogram.clone()),
        }
    }

    /// Turns caller supplied pairs into a label set, requiring exactly the
    /// declared label names.
    fn resolve<'a>(
        &self,
        labels: &[(&'a str, &'a str)],
    ) -> Result<HashMap<&'a str, &'a str>, MetricsError> {
        let declared: HashSet<&str> = self
            .definition
            .label_names
            .iter()
            .map(String::as_str)
            .collect();
        let resolved: HashMap<&str, &str> = labels.iter().copied().collect();

        let exact = resolved.len() == labels.len()
            && resolved.len() == declared.len()
            && resolved.keys().all(|name| declared.contains(name));

        if exact {
            Ok(resolved)
        } else {
            Err(MetricsError::LabelMismatch {
                identity: self.definition.identity.clone(),
                expected: self.definition.label_names.clone(),
                given: labels.iter().map(|(name, _)| name.to_string()).collect(),
            })
        }
    }

    fn kind_mismatch(&self, operation: &'static str) -> MetricsError {
        MetricsError::KindMismatch {
            identity: self.definition.identity.clone(),
            actual: self.definition.kind.as_str(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_handle() -> MetricHandle {
        MetricHandle::build(MetricDefinition::counter(
            MetricIdentity::perceiver("errors"),
            "errors",
            &["stage", "errorName"],
        ))
        .expect("counter should build")
    }

    #[test]
    fn label_order_does_not_matter() {
        let handle = errors_handle();
        assert!(handle
            .inc(&[("errorName", "timeout"), ("stage", "scan")])
            .is_ok());
        assert!(handle
            .inc(&[("stage", "scan"), ("errorName", "timeout")])
            .is_ok());
    }

    #[test]
    fn missing_extra_or_repeated_labels_are_rejected() {
        let handle = errors_handle();
        let cases: [&[(&str, &str)]; 4] = [
            &[("stage", "scan")],
            &[("stage", "scan"), ("errorName", "x"), ("extra", "y")],
            &[("stage", "scan"), ("stage", "scan")],
            &[("stage", "scan"), ("error_name", "x")],
        ];
        for labels in cases {
            assert!(
                matches!(handle.inc(labels), Err(MetricsError::LabelMismatch { .. })),
                "labels {:?} should be rejected",
                labels
            );
        }
    }

    #[test]
    fn counter_cannot_observe() {
        let handle = errors_handle();
        let result = handle.observe(&[("stage", "scan"), ("errorName", "x")], 1.0);
        assert!(matches!(result, Err(MetricsError::KindMismatch { .. })));
    }

    #[test]
    fn histogram_cannot_increment() {
        let handle = MetricHandle::build(MetricDefinition::histogram(
            MetricIdentity::perceiver("timings"),
            "timings",
            &["operation"],
            vec![1.0, 2.0],
        ))
        .expect("histogram should build");
        let result = handle.inc(&[("operation", "scan")]);
        assert!(matches!(result, Err(MetricsError::KindMismatch { .. })));
    }
}
