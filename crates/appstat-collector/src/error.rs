//! Collector error types.

use appstat_monitor::MonitorError;

/// Failure reported by a [`RowFetcher`](crate::fetcher::RowFetcher).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The control plane could not be reached or refused the request.
    #[error("row source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read row snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode row snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors that can occur while configuring or running the collector.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// Invalid or incomplete configuration. Fatal at construction time.
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The metrics backend rejected a gauge registration.
    #[error("registry error: {0}")]
    Registry(#[from] MonitorError),

    #[error("collector already started")]
    AlreadyStarted,
}

/// Convenience result type.
pub type CollectorResult<T> = std::result::Result<T, CollectorError>;
