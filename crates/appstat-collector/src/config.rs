//! Configuration for the app-stat collector.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{CollectorError, CollectorResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Cluster name used to label logs. Must be non-empty.
    #[serde(default)]
    pub cluster: String,

    /// Seconds between two collection cycles.
    #[serde(default = "default_app_stat_interval_seconds")]
    pub app_stat_interval_seconds: u64,

    /// Control-plane (meta server) endpoints as `ip:port`.
    #[serde(default)]
    pub meta_servers: Vec<String>,
}

fn default_app_stat_interval_seconds() -> u64 {
    10
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cluster: String::new(),
            app_stat_interval_seconds: default_app_stat_interval_seconds(),
            meta_servers: Vec::new(),
        }
    }
}

impl CollectorConfig {
    pub fn from_toml_str(content: &str) -> CollectorResult<Self> {
        let config: CollectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> CollectorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CollectorResult<()> {
        if self.cluster.trim().is_empty() {
            return Err(CollectorError::Config("cluster name must not be empty".into()));
        }
        if self.app_stat_interval_seconds == 0 {
            return Err(CollectorError::Config(
                "app_stat_interval_seconds must be at least 1".into(),
            ));
        }
        self.meta_server_addrs()?;
        Ok(())
    }

    pub fn app_stat_interval(&self) -> Duration {
        Duration::from_secs(self.app_stat_interval_seconds)
    }

    pub fn meta_server_addrs(&self) -> CollectorResult<Vec<SocketAddr>> {
        self.meta_servers
            .iter()
            .map(|s| {
                s.parse::<SocketAddr>().map_err(|e| {
                    CollectorError::Config(format!("invalid meta server address {s:?}: {e}"))
                })
            })
            .collect()
    }
}
