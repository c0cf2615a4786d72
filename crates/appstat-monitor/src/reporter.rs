use crate::sample::Sample;

/// Ships a batch of samples somewhere. Returns how many were shipped.
pub trait Reporter: Send + Sync {
    fn report(&self, samples: &[Sample]) -> usize;
}

/// Dumps samples as `tracing` events, one per gauge, ordered by name.
///
/// With a family set, samples tagged with another family (or none) are
/// skipped, so a dump of a shared registry shows only one metric family.
#[derive(Debug, Clone, Default)]
pub struct LogReporter {
    family: Option<String>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_family(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
        }
    }

    fn selects(&self, sample: &Sample) -> bool {
        match &self.family {
            Some(family) => sample.tags.get("family") == Some(family),
            None => true,
        }
    }
}

impl Reporter for LogReporter {
    fn report(&self, samples: &[Sample]) -> usize {
        let mut selected: Vec<&Sample> = samples.iter().filter(|s| self.selects(s)).collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name));

        for sample in &selected {
            tracing::info!(
                family = sample.tags.get("family").map(String::as_str).unwrap_or("-"),
                gauge = %sample.name,
                value = sample.value,
                at = %sample.timestamp.to_rfc3339(),
                "gauge"
            );
        }
        tracing::debug!(
            reported = selected.len(),
            skipped = samples.len() - selected.len(),
            "Metrics dump finished"
        );
        selected.len()
    }
}
