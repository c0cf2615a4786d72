//! Sources of per-application rows.
//!
//! The collector does not talk to the control plane itself; it asks a
//! [`RowFetcher`] for the current rows on every cycle. This module provides:
//!
//! - `StaticRowFetcher`: rows held in memory, swappable at runtime, with
//!   failure and latency injection for tests and embedding.
//! - `FileRowFetcher`: reads a JSON snapshot written by an external
//!   control-plane dump.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::FetchError;
use crate::row::{RowData, StatScope};

/// Returns the current usage rows of the store's applications.
///
/// Implementations own their timeout and retry policy; the collector awaits
/// the call without a deadline of its own.
#[async_trait]
pub trait RowFetcher: Send + Sync {
    async fn fetch_rows(&self, scope: &StatScope) -> Result<Vec<RowData>, FetchError>;
}

/// Serves rows from memory.
pub struct StaticRowFetcher {
    rows: Mutex<Vec<RowData>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    fetch_count: AtomicU64,
}

impl StaticRowFetcher {
    pub fn new(rows: Vec<RowData>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Replace the rows returned by subsequent fetches.
    pub fn set_rows(&self, rows: Vec<RowData>) {
        *self.rows.lock() = rows;
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Sleep this long inside every fetch before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Number of fetches attempted so far, including failed ones.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

impl Default for StaticRowFetcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RowFetcher for StaticRowFetcher {
    async fn fetch_rows(&self, scope: &StatScope) -> Result<Vec<RowData>, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::Relaxed) {
            return Err(FetchError::Unavailable("injected failure".to_string()));
        }

        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| scope.matches(&row.app_name))
            .cloned()
            .collect())
    }
}

/// Reads rows from a JSON array on disk.
///
/// The file is re-read on every fetch; a missing or malformed file is a fetch
/// failure, so the collector keeps the last published values.
pub struct FileRowFetcher {
    path: PathBuf,
    meta_servers: Vec<SocketAddr>,
}

impl FileRowFetcher {
    /// `meta_servers` are the control-plane endpoints the external dump
    /// queries; the fetcher never connects to them itself but reports them
    /// with every snapshot it reads.
    pub fn new(path: impl Into<PathBuf>, meta_servers: Vec<SocketAddr>) -> Self {
        let path = path.into();
        tracing::info!(
            path = %path.display(),
            meta_servers = ?meta_servers,
            "Reading app stat rows from snapshot"
        );
        Self { path, meta_servers }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Control-plane endpoints the snapshot was taken from.
    pub fn meta_servers(&self) -> &[SocketAddr] {
        &self.meta_servers
    }
}

#[async_trait]
impl RowFetcher for FileRowFetcher {
    async fn fetch_rows(&self, scope: &StatScope) -> Result<Vec<RowData>, FetchError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let rows: Vec<RowData> = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            meta_servers = ?self.meta_servers,
            rows = rows.len(),
            "Loaded row snapshot"
        );
        Ok(rows
            .into_iter()
            .filter(|row| scope.matches(&row.app_name))
            .collect())
    }
}
