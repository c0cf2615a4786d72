/// Errors raised by the metrics registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// A gauge with the same name has already been registered.
    #[error("metric {name} already registered in family {family}")]
    DuplicateMetric { family: String, name: String },
}
