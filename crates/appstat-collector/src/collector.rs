//! The collector service: configuration, aggregator, and timer in one place.

use appstat_monitor::MetricsRegistry;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::aggregator::{AppStatAggregator, CycleOutcome};
use crate::config::CollectorConfig;
use crate::counters::CounterStore;
use crate::error::{CollectorError, CollectorResult};
use crate::fetcher::RowFetcher;
use crate::scheduler::PeriodicTask;

/// Periodically publishes per-application statistics of one cluster.
///
/// Each instance owns its own [`CounterStore`], so several collectors can
/// live in one process as long as they publish into different registries.
pub struct InfoCollector {
    config: CollectorConfig,
    aggregator: Arc<AppStatAggregator>,
    task: Mutex<Option<Arc<PeriodicTask>>>,
}

impl InfoCollector {
    /// Build a collector. Fails if the configuration is invalid, most notably
    /// when the cluster name is empty.
    pub fn new(
        config: CollectorConfig,
        fetcher: Arc<dyn RowFetcher>,
        registry: Arc<MetricsRegistry>,
    ) -> CollectorResult<Self> {
        config.validate()?;
        let aggregator = Arc::new(AppStatAggregator::new(
            config.cluster.clone(),
            fetcher,
            registry,
        ));
        Ok(Self {
            config,
            aggregator,
            task: Mutex::new(None),
        })
    }

    pub fn cluster(&self) -> &str {
        &self.config.cluster
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn counters(&self) -> &Arc<CounterStore> {
        self.aggregator.counters()
    }

    /// Start the app-stat timer. The first cycle runs one interval from now.
    ///
    /// A collector can be started once; a second call returns
    /// [`CollectorError::AlreadyStarted`] even after `stop`.
    pub fn start(&self) -> CollectorResult<()> {
        let mut task = self.task.lock();
        if task.is_some() {
            return Err(CollectorError::AlreadyStarted);
        }

        let aggregator = self.aggregator.clone();
        let cluster = self.config.cluster.clone();
        *task = Some(Arc::new(PeriodicTask::start(
            "app-stat",
            self.config.app_stat_interval(),
            move || {
                let aggregator = aggregator.clone();
                let cluster = cluster.clone();
                async move {
                    if let Err(e) = aggregator.run_cycle().await {
                        tracing::error!(cluster = %cluster, error = %e, "App stat cycle failed");
                    }
                }
            },
        )));

        tracing::info!(
            cluster = %self.config.cluster,
            interval_secs = self.config.app_stat_interval_seconds,
            meta_servers = ?self.config.meta_servers,
            "App stat collector started"
        );
        Ok(())
    }

    /// Stop the timer and wait for a running cycle to finish.
    ///
    /// Safe to call repeatedly, before `start`, or from within a cycle.
    pub async fn stop(&self) {
        let task = self.task.lock().clone();
        if let Some(task) = task {
            task.stop().await;
            tracing::info!(cluster = %self.config.cluster, "App stat collector stopped");
        }
    }

    /// Run one cycle immediately, outside the timer.
    pub async fn run_cycle(&self) -> CollectorResult<CycleOutcome> {
        self.aggregator.run_cycle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticRowFetcher;
    use crate::row::RowData;

    fn config(cluster: &str) -> CollectorConfig {
        CollectorConfig {
            cluster: cluster.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_cluster_refuses_to_build() {
        let result = InfoCollector::new(
            config(""),
            Arc::new(StaticRowFetcher::default()),
            Arc::new(MetricsRegistry::new()),
        );
        assert!(matches!(result, Err(CollectorError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_cycle_without_timer() {
        let fetcher = Arc::new(StaticRowFetcher::new(vec![RowData {
            get_qps: 5.0,
            ..RowData::new("app1")
        }]));
        let registry = Arc::new(MetricsRegistry::new());
        let collector = InfoCollector::new(config("onebox"), fetcher, registry.clone()).unwrap();

        collector.run_cycle().await.unwrap();
        assert_eq!(collector.cluster(), "onebox");
        assert_eq!(collector.counters().app_names(), vec!["_all_", "app1"]);
        assert_eq!(registry.gauge("app.stat.get_qps#_all_").unwrap().get(), 5.0);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let collector = InfoCollector::new(
            config("onebox"),
            Arc::new(StaticRowFetcher::default()),
            Arc::new(MetricsRegistry::new()),
        )
        .unwrap();

        collector.start().unwrap();
        assert!(matches!(collector.start(), Err(CollectorError::AlreadyStarted)));
        collector.stop().await;
        assert!(matches!(collector.start(), Err(CollectorError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let collector = InfoCollector::new(
            config("onebox"),
            Arc::new(StaticRowFetcher::default()),
            Arc::new(MetricsRegistry::new()),
        )
        .unwrap();
        collector.stop().await;
        collector.stop().await;
    }
}
