use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::MonitorError;
use crate::metrics::{Counter, Gauge};
use crate::sample::Sample;

/// Thread-safe registry of named metrics.
///
/// Gauges must be registered exactly once by name; a second registration is
/// rejected so that two owners never silently share (and fight over) the same
/// exported value. Counters are created on first lookup.
pub struct MetricsRegistry {
    counters: DashMap<String, Arc<Counter>>,
    gauges: DashMap<String, Arc<Gauge>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
            gauges: DashMap::new(),
        }
    }

    pub fn counter(&self, name: &str) -> Arc<Counter> {
        self.counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new(name)))
            .value()
            .clone()
    }

    /// Register a new gauge under `family`.
    ///
    /// Fails with [`MonitorError::DuplicateMetric`] if `name` is taken.
    pub fn register_gauge(
        &self,
        family: &str,
        name: &str,
        description: &str,
    ) -> Result<Arc<Gauge>, MonitorError> {
        match self.gauges.entry(name.to_string()) {
            Entry::Occupied(_) => Err(MonitorError::DuplicateMetric {
                family: family.to_string(),
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let gauge = Arc::new(Gauge::new(family, name, description));
                slot.insert(gauge.clone());
                tracing::trace!(family, name, "Registered gauge");
                Ok(gauge)
            }
        }
    }

    /// Remove a gauge so its name can be registered again.
    pub fn unregister_gauge(&self, name: &str) -> Option<Arc<Gauge>> {
        self.gauges.remove(name).map(|(_, gauge)| gauge)
    }

    /// Look up a previously registered gauge.
    pub fn gauge(&self, name: &str) -> Option<Arc<Gauge>> {
        self.gauges.get(name).map(|entry| entry.value().clone())
    }

    pub fn gauge_count(&self) -> usize {
        self.gauges.len()
    }

    pub fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        for entry in self.counters.iter() {
            let counter = entry.value();
            samples.push(Sample::new(counter.name(), counter.get() as f64));
        }

        for entry in self.gauges.iter() {
            samples.push(Sample::from_gauge(entry.value()));
        }

        samples
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
