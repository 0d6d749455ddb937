//! Run summary counts.

use std::fmt;

use super::{DownloadResult, DownloadStatus};

/// Counts of each status across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Total number of results counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.ok + self.skipped + self.failed
    }

    /// True if any URL failed. Drives the non-zero exit status.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok={} skipped={} failed={}",
            self.ok, self.skipped, self.failed
        )
    }
}

/// Tallies results by status.
#[must_use]
pub fn summarize(results: &[DownloadResult]) -> RunSummary {
    results
        .iter()
        .fold(RunSummary::default(), |mut summary, result| {
            match result.status() {
                DownloadStatus::Ok => summary.ok += 1,
                DownloadStatus::Skipped => summary.skipped += 1,
                DownloadStatus::Failed => summary.failed += 1,
            }
            summary
        })
}
