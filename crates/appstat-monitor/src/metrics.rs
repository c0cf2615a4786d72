use std::sync::atomic::{AtomicU64, Ordering};

pub struct Counter {
    name: String,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A numeric gauge holding the last value written to it.
///
/// The value is stored as the bit pattern of an `f64` so that readers never
/// take a lock; a scrape racing a writer sees either the old or the new value.
pub struct Gauge {
    family: String,
    name: String,
    description: String,
    bits: AtomicU64,
}

impl Gauge {
    pub fn new(
        family: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
            description: description.into(),
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn set(&self, val: f64) {
        self.bits.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
