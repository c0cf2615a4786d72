//! Per-application gauge bundles and the store that owns them.

use appstat_monitor::{Gauge, MetricsRegistry, MonitorError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::row::RowData;

/// Metric family every app-stat gauge is registered under.
pub const METRIC_FAMILY: &str = "app.pegasus";

/// One exported value of a [`RowData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppStatField {
    GetQps,
    MultiGetQps,
    PutQps,
    MultiPutQps,
    RemoveQps,
    MultiRemoveQps,
    IncrQps,
    CheckAndSetQps,
    CheckAndMutateQps,
    ScanQps,
    RecentExpireCount,
    RecentFilterCount,
    RecentAbnormalCount,
    StorageMb,
    StorageCount,
    ReadQps,
    WriteQps,
}

impl AppStatField {
    /// Every field, in bundle order.
    pub const ALL: [AppStatField; 17] = [
        AppStatField::GetQps,
        AppStatField::MultiGetQps,
        AppStatField::PutQps,
        AppStatField::MultiPutQps,
        AppStatField::RemoveQps,
        AppStatField::MultiRemoveQps,
        AppStatField::IncrQps,
        AppStatField::CheckAndSetQps,
        AppStatField::CheckAndMutateQps,
        AppStatField::ScanQps,
        AppStatField::RecentExpireCount,
        AppStatField::RecentFilterCount,
        AppStatField::RecentAbnormalCount,
        AppStatField::StorageMb,
        AppStatField::StorageCount,
        AppStatField::ReadQps,
        AppStatField::WriteQps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppStatField::GetQps => "get_qps",
            AppStatField::MultiGetQps => "multi_get_qps",
            AppStatField::PutQps => "put_qps",
            AppStatField::MultiPutQps => "multi_put_qps",
            AppStatField::RemoveQps => "remove_qps",
            AppStatField::MultiRemoveQps => "multi_remove_qps",
            AppStatField::IncrQps => "incr_qps",
            AppStatField::CheckAndSetQps => "check_and_set_qps",
            AppStatField::CheckAndMutateQps => "check_and_mutate_qps",
            AppStatField::ScanQps => "scan_qps",
            AppStatField::RecentExpireCount => "recent_expire_count",
            AppStatField::RecentFilterCount => "recent_filter_count",
            AppStatField::RecentAbnormalCount => "recent_abnormal_count",
            AppStatField::StorageMb => "storage_mb",
            AppStatField::StorageCount => "storage_count",
            AppStatField::ReadQps => "read_qps",
            AppStatField::WriteQps => "write_qps",
        }
    }

    /// Exported gauge name, e.g. `app.stat.get_qps#app1`.
    pub fn metric_name(self, app_name: &str) -> String {
        format!("app.stat.{}#{}", self.as_str(), app_name)
    }

    pub fn description(self, app_name: &str) -> String {
        format!("statistic the {} of app {}", self.as_str(), app_name)
    }

    pub fn value_of(self, row: &RowData) -> f64 {
        match self {
            AppStatField::GetQps => row.get_qps,
            AppStatField::MultiGetQps => row.multi_get_qps,
            AppStatField::PutQps => row.put_qps,
            AppStatField::MultiPutQps => row.multi_put_qps,
            AppStatField::RemoveQps => row.remove_qps,
            AppStatField::MultiRemoveQps => row.multi_remove_qps,
            AppStatField::IncrQps => row.incr_qps,
            AppStatField::CheckAndSetQps => row.check_and_set_qps,
            AppStatField::CheckAndMutateQps => row.check_and_mutate_qps,
            AppStatField::ScanQps => row.scan_qps,
            AppStatField::RecentExpireCount => row.recent_expire_count,
            AppStatField::RecentFilterCount => row.recent_filter_count,
            AppStatField::RecentAbnormalCount => row.recent_abnormal_count,
            AppStatField::StorageMb => row.storage_mb,
            AppStatField::StorageCount => row.storage_count,
            AppStatField::ReadQps => row.read_qps(),
            AppStatField::WriteQps => row.write_qps(),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The 17 gauges exported for one application.
pub struct AppStatCounters {
    app_name: String,
    gauges: Vec<Arc<Gauge>>,
}

impl AppStatCounters {
    /// Register one gauge per [`AppStatField`] for `app_name`.
    ///
    /// All or nothing: if any name is rejected, the gauges registered so far
    /// are removed again before the error is returned.
    fn register(registry: &MetricsRegistry, app_name: &str) -> Result<Self, MonitorError> {
        let mut gauges = Vec::with_capacity(AppStatField::ALL.len());
        for field in AppStatField::ALL {
            let registered = registry.register_gauge(
                METRIC_FAMILY,
                &field.metric_name(app_name),
                &field.description(app_name),
            );
            match registered {
                Ok(gauge) => gauges.push(gauge),
                Err(e) => {
                    for gauge in &gauges {
                        registry.unregister_gauge(gauge.name());
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            app_name: app_name.to_string(),
            gauges,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn gauge(&self, field: AppStatField) -> &Arc<Gauge> {
        &self.gauges[field.index()]
    }

    pub fn value(&self, field: AppStatField) -> f64 {
        self.gauge(field).get()
    }

    /// Overwrite every gauge with the matching value from `row`.
    pub fn update(&self, row: &RowData) {
        for field in AppStatField::ALL {
            self.gauge(field).set(field.value_of(row));
        }
    }
}

/// Application name to gauge bundle, grown on demand and never shrunk.
pub struct CounterStore {
    registry: Arc<MetricsRegistry>,
    counters: Mutex<HashMap<String, Arc<AppStatCounters>>>,
}

impl CounterStore {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Return the bundle for `app_name`, registering its gauges on first use.
    ///
    /// Lookup and insert happen under one lock so each name is registered
    /// with the registry at most once.
    pub fn get_or_create(&self, app_name: &str) -> Result<Arc<AppStatCounters>, MonitorError> {
        let mut counters = self.counters.lock();
        if let Some(existing) = counters.get(app_name) {
            return Ok(existing.clone());
        }

        let created = Arc::new(AppStatCounters::register(&self.registry, app_name)?);
        counters.insert(app_name.to_string(), created.clone());
        tracing::debug!(app_name, "Created app stat counters");
        Ok(created)
    }

    pub fn get(&self, app_name: &str) -> Option<Arc<AppStatCounters>> {
        self.counters.lock().get(app_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }

    /// Names of all applications seen so far, sorted.
    pub fn app_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.counters.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }
}
