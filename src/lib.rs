//! imgdl Core Library
//!
//! This library provides the download orchestration engine behind the `imgdl`
//! tool: it turns a text file of URLs into files on disk, retrying transient
//! failures and optionally running several downloads in parallel.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Link file parsing (comments, delimiters, deduplication)
//! - [`download`] - Filename sanitizing, HTTP transport with retry policy,
//!   per-URL fetch with atomic writes, and the bounded-concurrency engine
//!
//! Logging goes through `tracing`; the library never installs a subscriber.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod parser;
mod user_agent;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use download::{
    ClientSettings, DEFAULT_WORKERS, DestinationRegistry, DownloadEngine, DownloadError,
    DownloadObserver, DownloadOutcome, DownloadResult, DownloadStatus, EngineError, FailureType,
    Fetcher, HttpClient, MAX_WORKERS, NoopObserver, RegistryError, RetryDecision, RetryPolicy,
    RunSummary, Sleeper, TokioSleeper, TracingObserver, resolve_destination, summarize,
};
pub use parser::{LinkList, LinkParser, ParseError, TextEncoding};
pub use user_agent::default_user_agent;
