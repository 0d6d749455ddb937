//! Per-URL download outcome.

use std::fmt;
use std::path::{Path, PathBuf};

/// Coarse status of one download, as shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// The file was fetched and written.
    Ok,
    /// The destination already existed with content; no request was made.
    Skipped,
    /// The download failed after all allowed attempts.
    Failed,
}

impl DownloadStatus {
    /// Lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body written to `path`.
    Downloaded {
        /// Final destination.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// `path` already held a non-empty file.
    Skipped {
        /// Existing destination.
        path: PathBuf,
    },
    /// The fetch failed.
    Failed {
        /// Human-readable error message.
        error: String,
    },
}

/// Result of fetching a single URL. Exactly one is produced per input URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// The URL as it appeared in the input.
    pub url: String,
    /// Outcome of the fetch.
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    /// Successful download.
    pub fn downloaded(url: impl Into<String>, path: PathBuf, bytes: u64) -> Self {
        Self {
            url: url.into(),
            outcome: DownloadOutcome::Downloaded { path, bytes },
        }
    }

    /// Skipped because the destination already exists.
    pub fn skipped(url: impl Into<String>, path: PathBuf) -> Self {
        Self {
            url: url.into(),
            outcome: DownloadOutcome::Skipped { path },
        }
    }

    /// Failed download.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: DownloadOutcome::Failed {
                error: error.into(),
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> DownloadStatus {
        match self.outcome {
            DownloadOutcome::Downloaded { .. } => DownloadStatus::Ok,
            DownloadOutcome::Skipped { .. } => DownloadStatus::Skipped,
            DownloadOutcome::Failed { .. } => DownloadStatus::Failed,
        }
    }

    /// Destination path for `ok` and `skipped` results.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            DownloadOutcome::Downloaded { path, .. } | DownloadOutcome::Skipped { path } => {
                Some(path)
            }
            DownloadOutcome::Failed { .. } => None,
        }
    }

    /// Error message for `failed` results.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            DownloadOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            DownloadOutcome::Downloaded { path, bytes } => {
                write!(f, "ok {} -> {} ({bytes} bytes)", self.url, path.display())
            }
            DownloadOutcome::Skipped { path } => {
                write!(f, "skipped {} (exists: {})", self.url, path.display())
            }
            DownloadOutcome::Failed { error } => write!(f, "failed {}: {error}", self.url),
        }
    }
}
