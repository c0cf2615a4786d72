//! Process-wide metrics registry for the app-stat collector.
//!
//! Gauges are registered once under a metric family and then overwritten in
//! place; counters are created on first use. `MetricsRegistry::collect`
//! snapshots everything into timestamped `Sample`s that a `Reporter` can ship.

pub mod error;
pub mod metrics;
pub mod registry;
pub mod reporter;
pub mod sample;

pub use error::MonitorError;
pub use metrics::{Counter, Gauge};
pub use registry::MetricsRegistry;
pub use reporter::{LogReporter, Reporter};
pub use sample::Sample;
