//! Point-in-time view of every declared metric, as read by the exporter.

use std::collections::BTreeMap;

use prometheus::proto;
use serde::Serialize;

use super::definition::{MetricDefinition, MetricIdentity, MetricKind};

/// One declared metric and all of its series at the time of the read.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    pub identity: MetricIdentity,
    pub help: String,
    pub kind: MetricKind,
    pub series: Vec<SeriesSnapshot>,
}

/// The aggregate for a single label set.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot {
    pub labels: BTreeMap<String, String>,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SeriesValue {
    Counter {
        value: f64,
    },
    Histogram {
        buckets: Vec<BucketCount>,
        count: u64,
        sum: f64,
    },
}

/// Number of observations less than or equal to `upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketCount {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

impl MetricSnapshot {
    pub(crate) fn from_family(
        definition: &MetricDefinition,
        family: Option<&proto::MetricFamily>,
    ) -> Self {
        let series = family
            .map(|family| {
                family
                    .get_metric()
                    .iter()
                    .map(|metric| SeriesSnapshot::from_metric(definition.kind, metric))
                    .collect()
            })
            .unwrap_or_default();

        MetricSnapshot {
            identity: definition.identity.clone(),
            help: definition.help.clone(),
            kind: definition.kind,
            series,
        }
    }

    /// Finds the series whose label set is exactly `labels`.
    pub fn series_with(&self, labels: &[(&str, &str)]) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|series| {
            series.labels.len() == labels.len()
                && labels.iter().all(|(name, value)| {
                    series.labels.get(*name).map(String::as_str) == Some(*value)
                })
        })
    }
}

impl SeriesSnapshot {
    fn from_metric(kind: MetricKind, metric: &proto::Metric) -> Self {
        let labels = metric
            .get_label()
            .iter()
            .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
            .collect();

        let value = match kind {
            MetricKind::Counter => SeriesValue::Counter {
                value: metric.get_counter().get_value(),
            },
            MetricKind::Histogram => {
                let histogram = metric.get_histogram();
                SeriesValue::Histogram {
                    buckets: histogram
                        .get_bucket()
                        .iter()
                        .filter(|bucket| bucket.get_upper_bound().is_finite())
                        .map(|bucket| BucketCount {
                            upper_bound: bucket.get_upper_bound(),
                            cumulative_count: bucket.get_cumulative_count(),
                        })
                        .collect(),
                    count: histogram.get_sample_count(),
                    sum: histogram.get_sample_sum(),
                }
            }
        };

        SeriesSnapshot { labels, value }
    }
}

impl SeriesValue {
    pub fn counter_value(&self) -> Option<f64> {
        match self {
            SeriesValue::Counter { value } => Some(*value),
            SeriesValue::Histogram { .. } => None,
        }
    }

    pub fn cumulative_counts(&self) -> Option<Vec<u64>> {
        match self {
            SeriesValue::Histogram { buckets, .. } => {
                Some(buckets.iter().map(|b| b.cumulative_count).collect())
            }
            SeriesValue::Counter { .. } => None,
        }
    }

    pub fn histogram_count(&self) -> Option<u64> {
        match self {
            SeriesValue::Histogram { count, .. } => Some(*count),
            SeriesValue::Counter { .. } => None,
        }
    }

    pub fn histogram_sum(&self) -> Option<f64> {
        match self {
            SeriesValue::Histogram { sum, .. } => Some(*sum),
            SeriesValue::Counter { .. } => None,
        }
    }
}
