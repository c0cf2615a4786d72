//! Periodic application-statistics collector.
//!
//! On every tick the collector pulls per-application usage rows from a
//! [`RowFetcher`], appends a synthetic `_all_` row holding the cluster-wide
//! totals, and overwrites one bundle of gauges per application in a shared
//! [`MetricsRegistry`](appstat_monitor::MetricsRegistry).
//!
//! The pieces compose in one direction:
//!
//! - [`PeriodicTask`] fires the cycle on a fixed period, never overlapping.
//! - [`AppStatAggregator`] fetches, totals, and publishes one cycle.
//! - [`CounterStore`] lazily creates the per-application gauge bundles.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod counters;
pub mod error;
pub mod fetcher;
pub mod row;
pub mod scheduler;

pub use aggregator::{AppStatAggregator, CycleOutcome, CycleSummary};
pub use collector::InfoCollector;
pub use config::CollectorConfig;
pub use counters::{AppStatCounters, AppStatField, CounterStore, METRIC_FAMILY};
pub use error::{CollectorError, CollectorResult, FetchError};
pub use fetcher::{FileRowFetcher, RowFetcher, StaticRowFetcher};
pub use row::{RowData, StatScope, ALL_APPS_ROW_NAME};
pub use scheduler::PeriodicTask;
