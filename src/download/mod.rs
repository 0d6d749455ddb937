//! Batch downloading of URLs into a directory.
//!
//! This module turns URLs into files on disk:
//!
//! - [`filename`] derives a safe destination name from each URL
//! - [`DestinationRegistry`] hands out names so concurrent downloads never
//!   collide, and remembers which URL produced which file
//! - [`HttpClient`] streams bodies to disk and retries transient failures per
//!   its [`RetryPolicy`]
//! - [`Fetcher`] applies the skip rule and writes each file atomically
//! - [`DownloadEngine`] runs a batch with bounded concurrency
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use imgdl_core::download::{
//!     ClientSettings, DownloadEngine, Fetcher, HttpClient, NoopObserver, RetryPolicy, summarize,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientSettings::default(), RetryPolicy::new(3, 0.5))?;
//! let fetcher = Arc::new(Fetcher::new(client, Arc::new(NoopObserver)));
//! let engine = DownloadEngine::new(1, fetcher, Arc::new(NoopObserver))?;
//!
//! let urls = vec!["https://example.com/a.jpg".to_string()];
//! let results = engine.run(&urls, Path::new("downloads")).await?;
//! println!("{}", summarize(&results));
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod fetch;
pub mod filename;
mod observer;
mod registry;
mod report;
mod result;
mod retry;

pub use client::{ClientSettings, HttpClient};
pub use engine::{DEFAULT_WORKERS, DownloadEngine, EngineError, MAX_WORKERS};
pub use error::DownloadError;
pub use fetch::Fetcher;
pub use filename::resolve_destination;
pub use observer::{DownloadObserver, NoopObserver, TracingObserver};
pub use registry::{DestinationRegistry, RegistryError};
pub use report::{RunSummary, summarize};
pub use result::{DownloadOutcome, DownloadResult, DownloadStatus};
pub use retry::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_RETRIES, FailureType, RetryDecision, RetryPolicy, Sleeper,
    TokioSleeper, parse_retry_after,
};

pub use constants::{DEFAULT_TIMEOUT_SECS, MANIFEST_FILENAME};
