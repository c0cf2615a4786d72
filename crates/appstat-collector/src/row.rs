//! Per-application usage rows.

use serde::{Deserialize, Serialize};

/// Name of the synthetic row carrying the cluster-wide totals.
pub const ALL_APPS_ROW_NAME: &str = "_all_";

/// Which applications a fetch should return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatScope {
    #[default]
    AllApps,
    App(String),
}

impl StatScope {
    pub fn matches(&self, app_name: &str) -> bool {
        match self {
            StatScope::AllApps => true,
            StatScope::App(name) => name == app_name,
        }
    }
}

/// One usage snapshot of a single application, or of the whole cluster for
/// the `_all_` row.
///
/// Values are taken as reported; negative numbers are not clamped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowData {
    #[serde(alias = "row_name")]
    pub app_name: String,

    pub get_qps: f64,
    pub multi_get_qps: f64,
    pub scan_qps: f64,

    pub put_qps: f64,
    pub multi_put_qps: f64,
    pub remove_qps: f64,
    pub multi_remove_qps: f64,
    pub incr_qps: f64,
    pub check_and_set_qps: f64,
    pub check_and_mutate_qps: f64,

    pub recent_expire_count: f64,
    pub recent_filter_count: f64,
    pub recent_abnormal_count: f64,
    pub storage_mb: f64,
    pub storage_count: f64,
}

impl RowData {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn read_qps(&self) -> f64 {
        self.get_qps + self.multi_get_qps + self.scan_qps
    }

    pub fn write_qps(&self) -> f64 {
        self.put_qps
            + self.multi_put_qps
            + self.remove_qps
            + self.multi_remove_qps
            + self.incr_qps
            + self.check_and_set_qps
            + self.check_and_mutate_qps
    }

    pub fn is_all_apps(&self) -> bool {
        self.app_name == ALL_APPS_ROW_NAME
    }

    /// Field-wise sum of `rows`, named `_all_`.
    ///
    /// Sums in a single left-to-right pass so repeated runs over the same
    /// input produce bit-identical totals.
    pub fn total_of(rows: &[RowData]) -> RowData {
        rows.iter().fold(RowData::new(ALL_APPS_ROW_NAME), |mut all, row| {
            all.accumulate(row);
            all
        })
    }

    fn accumulate(&mut self, row: &RowData) {
        self.get_qps += row.get_qps;
        self.multi_get_qps += row.multi_get_qps;
        self.scan_qps += row.scan_qps;
        self.put_qps += row.put_qps;
        self.multi_put_qps += row.multi_put_qps;
        self.remove_qps += row.remove_qps;
        self.multi_remove_qps += row.multi_remove_qps;
        self.incr_qps += row.incr_qps;
        self.check_and_set_qps += row.check_and_set_qps;
        self.check_and_mutate_qps += row.check_and_mutate_qps;
        self.recent_expire_count += row.recent_expire_count;
        self.recent_filter_count += row.recent_filter_count;
        self.recent_abnormal_count += row.recent_abnormal_count;
        self.storage_mb += row.storage_mb;
        self.storage_count += row.storage_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(name: &str, base: f64) -> RowData {
        RowData {
            app_name: name.to_string(),
            get_qps: base,
            multi_get_qps: base + 1.0,
            scan_qps: base + 2.0,
            put_qps: base + 3.0,
            multi_put_qps: base + 4.0,
            remove_qps: base + 5.0,
            multi_remove_qps: base + 6.0,
            incr_qps: base + 7.0,
            check_and_set_qps: base + 8.0,
            check_and_mutate_qps: base + 9.0,
            recent_expire_count: base + 10.0,
            recent_filter_count: base + 11.0,
            recent_abnormal_count: base + 12.0,
            storage_mb: base + 13.0,
            storage_count: base + 14.0,
        }
    }

    #[test]
    fn test_read_and_write_qps() {
        let row = sample_row("app1", 1.0);
        assert_eq!(row.read_qps(), 1.0 + 2.0 + 3.0);
        assert_eq!(row.write_qps(), 4.0 + 5.0 + 6.0 + 7.0 + 8.0 + 9.0 + 10.0);
    }

    #[test]
    fn test_total_of_two_rows() {
        let a = sample_row("app1", 2.0);
        let b = sample_row("app2", 3.0);
        let all = RowData::total_of(&[a.clone(), b.clone()]);

        assert_eq!(all.app_name, ALL_APPS_ROW_NAME);
        assert_eq!(all.get_qps, 5.0);
        assert_eq!(all.multi_get_qps, a.multi_get_qps + b.multi_get_qps);
        assert_eq!(all.check_and_mutate_qps, a.check_and_mutate_qps + b.check_and_mutate_qps);
        assert_eq!(all.recent_abnormal_count, a.recent_abnormal_count + b.recent_abnormal_count);
        assert_eq!(all.storage_count, a.storage_count + b.storage_count);
        assert_eq!(all.read_qps(), a.read_qps() + b.read_qps());
        assert_eq!(all.write_qps(), a.write_qps() + b.write_qps());
    }

    #[test]
    fn test_total_of_empty_is_zero() {
        let all = RowData::total_of(&[]);
        assert_eq!(all, RowData::new(ALL_APPS_ROW_NAME));
        assert_eq!(all.read_qps(), 0.0);
        assert_eq!(all.write_qps(), 0.0);
    }

    #[test]
    fn test_total_of_single_row_copies_values() {
        let row = sample_row("only", 4.0);
        let all = RowData::total_of(std::slice::from_ref(&row));
        assert_eq!(all, RowData { app_name: ALL_APPS_ROW_NAME.to_string(), ..row });
    }

    #[test]
    fn test_negative_values_pass_through() {
        let mut row = RowData::new("app1");
        row.get_qps = -2.0;
        row.scan_qps = 1.0;
        assert_eq!(row.read_qps(), -1.0);
        assert_eq!(RowData::total_of(&[row]).get_qps, -2.0);
    }

    #[test]
    fn test_deserialize_with_row_name_alias_and_missing_fields() {
        let row: RowData = serde_json::from_str(r#"{"row_name": "app1", "get_qps": 5.0}"#).unwrap();
        assert_eq!(row.app_name, "app1");
        assert_eq!(row.get_qps, 5.0);
        assert_eq!(row.storage_mb, 0.0);
    }

    #[test]
    fn test_scope_matches() {
        assert!(StatScope::AllApps.matches("anything"));
        assert!(StatScope::App("app1".into()).matches("app1"));
        assert!(!StatScope::App("app1".into()).matches("app2"));
    }
}
