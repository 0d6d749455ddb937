//! Configuration lifecycle: validate CLI values and resolve them into an `AppConfig`.

use std::path::PathBuf;
use std::time::Duration;

use imgdl_core::download::{DEFAULT_TIMEOUT_SECS, RetryPolicy};
use imgdl_core::{ClientSettings, MAX_WORKERS, ParseError, TextEncoding, default_user_agent};

use crate::cli::Args;

/// Log file name used when `--log-file` is not given.
const DEFAULT_LOG_FILENAME: &str = "download.log";

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) input: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) log_file: PathBuf,
    pub(crate) timeout: Duration,
    pub(crate) retries: u32,
    pub(crate) backoff: f64,
    pub(crate) workers: usize,
    pub(crate) encoding: TextEncoding,
    pub(crate) user_agent: String,
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
    /// Values that were out of range and replaced, logged once tracing is up.
    pub(crate) adjustments: Vec<String>,
}

impl AppConfig {
    pub(crate) fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            ..ClientSettings::default()
        }
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.backoff)
    }
}

/// Validates CLI values and clamps out-of-range numbers.
///
/// # Errors
///
/// Returns [`ParseError::UnsupportedEncoding`] for an unknown `--encoding`.
pub(crate) fn resolve_config(args: &Args) -> Result<AppConfig, ParseError> {
    let encoding: TextEncoding = args.encoding.parse()?;
    let mut adjustments = Vec::new();

    let timeout_secs = if args.timeout.is_finite() && args.timeout > 0.0 {
        args.timeout
    } else {
        adjustments.push(format!(
            "timeout {} is not positive, using {DEFAULT_TIMEOUT_SECS}s",
            args.timeout
        ));
        DEFAULT_TIMEOUT_SECS
    };
    let timeout = Duration::try_from_secs_f64(timeout_secs)
        .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS));

    let backoff = if args.backoff.is_finite() && args.backoff >= 0.0 {
        args.backoff
    } else {
        adjustments.push(format!("backoff {} is invalid, using 0", args.backoff));
        0.0
    };

    let retries = u32::try_from(args.retries.max(0)).unwrap_or(u32::MAX);
    if args.retries < 0 {
        adjustments.push(format!("retries {} is negative, using 0", args.retries));
    }

    let max_workers = i64::try_from(MAX_WORKERS).unwrap_or(i64::MAX);
    let clamped = args.workers.clamp(1, max_workers);
    if clamped != args.workers {
        adjustments.push(format!(
            "workers {} out of range 1-{MAX_WORKERS}, using {clamped}",
            args.workers
        ));
    }
    let workers = usize::try_from(clamped).unwrap_or(1);

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| args.output.join(DEFAULT_LOG_FILENAME));
    let user_agent = args
        .user_agent
        .clone()
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(default_user_agent);

    Ok(AppConfig {
        input: args.input.clone(),
        output_dir: args.output.clone(),
        log_file,
        timeout,
        retries,
        backoff,
        workers,
        encoding,
        user_agent,
        verbose: args.verbose,
        quiet: args.quiet,
        adjustments,
    })
}
