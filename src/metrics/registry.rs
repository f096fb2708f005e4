//! Process-wide set of declared metrics and the read path used by the exporter.

use std::collections::HashMap;

use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{debug, info};

use super::definition::{MetricDefinition, MetricIdentity};
use super::error::MetricsError;
use super::handle::MetricHandle;
use super::snapshot::MetricSnapshot;

/// Owns every metric declaration and the Prometheus registry they are exported through.
///
/// Built mutably during startup (`declare` then `register_all`) and shared
/// read-only afterwards, so the read path needs no synchronization of its own.
pub struct MetricsRegistry {
    exporter: Registry,
    declared: Vec<MetricHandle>,
    by_identity: HashMap<MetricIdentity, usize>,
    registered: bool,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry {
            exporter: Registry::new(),
            declared: Vec::new(),
            by_identity: HashMap::new(),
            registered: false,
        }
    }

    /// Declares a metric and returns the handle recorders update.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate identity, an invalid label schema or bucket list,
    /// or when called after [`Self::register_all`].
    pub fn declare(&mut self, definition: MetricDefinition) -> Result<MetricHandle, MetricsError> {
        if self.registered {
            return Err(MetricsError::DeclaredAfterRegistration(
                definition.identity,
            ));
        }
        // The exporter keys on the joined name, so ("a_b", "c") and ("a", "b_c") collide.
        let fq_name = definition.identity.fq_name();
        if self.by_identity.contains_key(&definition.identity)
            || self.definitions().any(|d| d.identity.fq_name() == fq_name)
        {
            return Err(MetricsError::DuplicateMetric(definition.identity));
        }
        definition.validate()?;

        let identity = definition.identity.clone();
        let handle = MetricHandle::build(definition)?;
        debug!(metric = %identity, kind = %handle.definition().kind, "Declared metric");

        self.by_identity.insert(identity, self.declared.len());
        self.declared.push(handle.clone());
        Ok(handle)
    }

    /// Hands every declared metric to the exporter. Allowed exactly once.
    pub fn register_all(&mut self) -> Result<(), MetricsError> {
        if self.registered {
            return Err(MetricsError::AlreadyRegistered);
        }
        for handle in &self.declared {
            self.exporter.register(handle.collector())?;
        }
        self.registered = true;
        info!("Registered {} metrics with the exporter", self.declared.len());
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.declared.iter().map(MetricHandle::definition)
    }

    pub fn handle(&self, identity: &MetricIdentity) -> Option<&MetricHandle> {
        self.by_identity.get(identity).map(|&i| &self.declared[i])
    }

    /// Reads the current aggregates of every declared metric, in declaration order.
    ///
    /// Each value is read atomically, but concurrent recordings may land
    /// between reads of different series.
    pub fn snapshot(&self) -> Result<Vec<MetricSnapshot>, MetricsError> {
        let families = self.gather()?;
        let by_name: HashMap<&str, &prometheus::proto::MetricFamily> = families
            .iter()
            .map(|family| (family.get_name(), family))
            .collect();

        Ok(self
            .definitions()
            .map(|definition| {
                let family = by_name.get(definition.identity.fq_name().as_str()).copied();
                MetricSnapshot::from_family(definition, family)
            })
            .collect())
    }

    /// Renders every registered metric in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let families = self.gather()?;
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn gather(&self) -> Result<Vec<prometheus::proto::MetricFamily>, MetricsError> {
        if !self.registered {
            return Err(MetricsError::NotRegistered);
        }
        Ok(self.exporter.gather())
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
