//! Progress hooks for download runs.
//!
//! The library reports progress through a [`DownloadObserver`] instead of
//! touching global state. Every method has a no-op default so implementations
//! only override what they need.

use std::time::Duration;

use tracing::{info, warn};

use super::{DownloadError, DownloadResult, DownloadStatus};

/// Receives events from the engine and the transport.
///
/// Called from worker tasks, so implementations must be cheap and thread-safe.
pub trait DownloadObserver: Send + Sync {
    /// A URL is about to be fetched. `index` is its 0-based input position.
    fn on_start(&self, _url: &str, _index: usize, _total: usize) {}

    /// Attempt `attempt` failed with `error`; the next one starts after `delay`.
    fn on_retry(&self, _url: &str, _attempt: u32, _delay: Duration, _error: &DownloadError) {}

    /// A URL has its final result.
    fn on_finish(&self, _result: &DownloadResult) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}

/// Observer that logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DownloadObserver for TracingObserver {
    fn on_start(&self, url: &str, index: usize, total: usize) {
        info!(url, position = index + 1, total, "downloading");
    }

    fn on_retry(&self, url: &str, attempt: u32, delay: Duration, error: &DownloadError) {
        warn!(
            url,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %error,
            "attempt failed, retrying"
        );
    }

    fn on_finish(&self, result: &DownloadResult) {
        match result.status() {
            DownloadStatus::Failed => warn!(
                url = %result.url,
                error = result.error().unwrap_or_default(),
                "failed"
            ),
            status => info!(
                url = %result.url,
                path = %result.path().map(|p| p.display().to_string()).unwrap_or_default(),
                %status,
                "finished"
            ),
        }
    }
}
