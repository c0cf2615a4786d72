//! One collection cycle: fetch, total, publish.

use appstat_monitor::{Counter, MetricsRegistry};
use std::sync::Arc;

use crate::counters::CounterStore;
use crate::error::CollectorResult;
use crate::fetcher::RowFetcher;
use crate::row::{RowData, StatScope};

const CYCLE_SUCCEED_COUNTER: &str = "collector.app_stat.cycle_succeed";
const CYCLE_FAILED_COUNTER: &str = "collector.app_stat.cycle_failed";

/// Totals reported by a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSummary {
    /// Number of real applications, excluding `_all_`.
    pub app_count: usize,
    pub total_read_qps: f64,
    pub total_write_qps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Succeeded(CycleSummary),
    /// The fetch failed; no gauge was touched.
    FetchFailed,
}

/// Fetches rows, appends the `_all_` total, and publishes every row.
pub struct AppStatAggregator {
    cluster: String,
    fetcher: Arc<dyn RowFetcher>,
    store: Arc<CounterStore>,
    cycle_succeed: Arc<Counter>,
    cycle_failed: Arc<Counter>,
}

impl AppStatAggregator {
    pub fn new(
        cluster: impl Into<String>,
        fetcher: Arc<dyn RowFetcher>,
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        let cycle_succeed = registry.counter(CYCLE_SUCCEED_COUNTER);
        let cycle_failed = registry.counter(CYCLE_FAILED_COUNTER);
        Self {
            cluster: cluster.into(),
            fetcher,
            store: Arc::new(CounterStore::new(registry)),
            cycle_succeed,
            cycle_failed,
        }
    }

    pub fn counters(&self) -> &Arc<CounterStore> {
        &self.store
    }

    /// Run one cycle.
    ///
    /// A fetch failure is logged and reported as [`CycleOutcome::FetchFailed`].
    /// A registry rejection is returned as an error after every other row has
    /// been published.
    pub async fn run_cycle(&self) -> CollectorResult<CycleOutcome> {
        tracing::info!(cluster = %self.cluster, "Start to stat apps");

        let mut rows = match self.fetcher.fetch_rows(&StatScope::AllApps).await {
            Ok(rows) => rows,
            Err(e) => {
                self.cycle_failed.increment();
                tracing::error!(cluster = %self.cluster, error = %e, "Failed to fetch app stat rows");
                return Ok(CycleOutcome::FetchFailed);
            }
        };

        rows.retain(|row| {
            if row.is_all_apps() {
                tracing::warn!(cluster = %self.cluster, "Dropping fetched row with reserved name _all_");
                return false;
            }
            true
        });

        let all = RowData::total_of(&rows);
        let summary = CycleSummary {
            app_count: rows.len(),
            total_read_qps: all.read_qps(),
            total_write_qps: all.write_qps(),
        };
        rows.push(all);

        // A rejected bundle must not hold back the rows after it, `_all_`
        // included; the first rejection is reported once every row is done.
        let mut first_error = None;
        for row in &rows {
            match self.store.get_or_create(&row.app_name) {
                Ok(counters) => counters.update(row),
                Err(e) => {
                    tracing::error!(
                        cluster = %self.cluster,
                        app_name = %row.app_name,
                        error = %e,
                        "Failed to create app stat counters"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            self.cycle_failed.increment();
            return Err(e.into());
        }

        self.cycle_succeed.increment();
        tracing::info!(
            cluster = %self.cluster,
            app_count = summary.app_count,
            total_read_qps = summary.total_read_qps,
            total_write_qps = summary.total_write_qps,
            "Stat apps succeed"
        );
        Ok(CycleOutcome::Succeeded(summary))
    }
}
