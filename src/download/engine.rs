//! Download engine for running a batch of URLs with bounded concurrency.
//!
//! # Overview
//!
//! The engine fetches every URL of a batch into one output directory using a
//! shared [`Fetcher`]. Each URL runs in its own Tokio task inside a
//! [`JoinSet`]; a semaphore bounds how many run at once. Every input URL
//! produces exactly one [`DownloadResult`], including URLs whose task panicked.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use imgdl_core::download::{
//!     ClientSettings, DownloadEngine, Fetcher, HttpClient, RetryPolicy, TracingObserver,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let observer = Arc::new(TracingObserver);
//! let client = HttpClient::new(&ClientSettings::default(), RetryPolicy::default())?;
//! let fetcher = Arc::new(Fetcher::new(client, observer.clone()));
//! let engine = DownloadEngine::new(4, fetcher, observer)?;
//!
//! let urls = vec!["https://example.com/a.jpg".to_string()];
//! let results = engine.run(&urls, Path::new("downloads")).await?;
//! assert_eq!(results.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::fetch::Fetcher;
use super::observer::DownloadObserver;
use super::registry::DestinationRegistry;
use super::report::summarize;
use super::result::DownloadResult;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 100;

/// Default worker count: one download at a time, in input order.
pub const DEFAULT_WORKERS: usize = 1;

/// Error type for download engine operations.
///
/// Only setup problems surface here; per-URL failures are results.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Download engine for concurrent file downloads.
///
/// # Concurrency Model
///
/// - Each URL runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task
/// - Permits are released automatically when tasks complete (RAII)
/// - With one worker every task is awaited before the next is spawned, so
///   results come back in input order
/// - Dropping the run future aborts the remaining tasks
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured worker count.
    workers: usize,
    fetcher: Arc<Fetcher>,
    observer: Arc<dyn DownloadObserver>,
}

impl std::fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("workers", &self.workers)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine running up to `workers` downloads at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if `workers` is outside 1-100.
    pub fn new(
        workers: usize,
        fetcher: Arc<Fetcher>,
        observer: Arc<dyn DownloadObserver>,
    ) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(EngineError::InvalidConcurrency { value: workers });
        }

        debug!(
            workers,
            max_attempts = fetcher.client().policy().max_attempts(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            fetcher,
            observer,
        })
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Downloads every URL in `urls` into `dest_dir`.
    ///
    /// Returns one result per URL: in input order with one worker, in
    /// completion order otherwise. The destination manifest is saved at the
    /// end; failing to save it is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutputDir`] if `dest_dir` cannot be created.
    /// Per-URL failures never abort the run.
    #[instrument(skip(self, urls), fields(urls = urls.len(), dest_dir = %dest_dir.display()))]
    pub async fn run(
        &self,
        urls: &[String],
        dest_dir: &Path,
    ) -> Result<Vec<DownloadResult>, EngineError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: dest_dir.to_path_buf(),
                source,
            })?;
        let registry = Arc::new(DestinationRegistry::open(dest_dir).await);
        let manifest_guard = ManifestGuard::new(Arc::clone(&registry));

        let total = urls.len();
        let mut results = Vec::with_capacity(total);
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<Id, String> = HashMap::new();

        info!(total, workers = self.workers, "starting downloads");

        for (index, url) in urls.iter().enumerate() {
            // Blocks while `workers` tasks are running
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let fetcher = Arc::clone(&self.fetcher);
            let registry = Arc::clone(&registry);
            let observer = Arc::clone(&self.observer);
            let task_url = url.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                observer.on_start(&task_url, index, total);
                fetcher.fetch_into(&task_url, &registry).await
            });
            in_flight.insert(handle.id(), url.clone());

            if self.workers == 1 {
                if let Some(joined) = tasks.join_next_with_id().await {
                    results.push(self.finish(joined, &mut in_flight));
                }
            } else {
                while let Some(joined) = tasks.try_join_next_with_id() {
                    results.push(self.finish(joined, &mut in_flight));
                }
            }
        }

        debug!(remaining = tasks.len(), "waiting for downloads to complete");
        while let Some(joined) = tasks.join_next_with_id().await {
            results.push(self.finish(joined, &mut in_flight));
        }

        manifest_guard.disarm();
        if let Err(e) = registry.persist().await {
            warn!(error = %e, "could not save destination manifest");
        }

        let summary = summarize(&results);
        info!(
            ok = summary.ok,
            skipped = summary.skipped,
            failed = summary.failed,
            "downloads complete"
        );

        Ok(results)
    }

    fn finish(
        &self,
        joined: Result<(Id, DownloadResult), JoinError>,
        in_flight: &mut HashMap<Id, String>,
    ) -> DownloadResult {
        let result = match joined {
            Ok((id, result)) => {
                in_flight.remove(&id);
                result
            }
            Err(error) => {
                let url = in_flight.remove(&error.id()).unwrap_or_default();
                let message = if error.is_panic() {
                    "download task panicked"
                } else {
                    "download task cancelled"
                };
                warn!(url = %url, "{message}");
                DownloadResult::failed(url, message)
            }
        };
        self.observer.on_finish(&result);
        result
    }
}

/// Saves the manifest when a run is dropped before it completes, so files
/// finished so far are recognized by the next run.
struct ManifestGuard {
    registry: Arc<DestinationRegistry>,
    armed: bool,
}

impl ManifestGuard {
    fn new(registry: Arc<DestinationRegistry>) -> Self {
        Self {
            registry,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ManifestGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.registry.persist_blocking() {
            Ok(()) => debug!("saved manifest of interrupted run"),
            Err(e) => warn!(error = %e, "could not save destination manifest"),
        }
    }
}
