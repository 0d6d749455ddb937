//! Retry policy with exponential backoff for transient download failures.
//!
//! The [`RetryPolicy`] is a declarative description of when the transport may
//! repeat a request: how many retries, the backoff curve, which HTTP statuses
//! are worth retrying, and which methods are safe to repeat. The transport
//! ([`HttpClient`](super::HttpClient)) owns one policy for its whole lifetime
//! and applies it transparently, so callers only ever see the final outcome.
//!
//! # Backoff curve
//!
//! ```text
//! delay(retry n) = backoff_factor * 2^(n - 1) seconds, capped at 120s
//! ```
//!
//! With the default factor of 0.5 the waits are 0.5s, 1s, 2s, ...
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use imgdl_core::download::{DownloadError, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, 0.5);
//! let error = DownloadError::http_status("https://example.com/a.jpg", 503);
//!
//! match policy.should_retry(policy.classify(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_millis(500));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::fmt;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use super::DownloadError;
use super::constants::{MAX_BACKOFF, MAX_RETRY_AFTER};

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default backoff factor in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;

/// HTTP statuses that signal a transient server or gateway condition.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Statuses for which a `Retry-After` header replaces the computed backoff.
const RETRY_AFTER_STATUSES: [u16; 2] = [429, 503];

/// Classification of download failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: timeout, connection reset, 500/502/503/504.
    Transient,

    /// Server rate limiting (HTTP 429). Retried like a transient failure.
    RateLimited,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404, invalid URL, empty body, local IO error.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry configuration attached to the HTTP transport.
///
/// # Default Values
///
/// - `retries`: 3 (so up to 4 attempts)
/// - `backoff_factor`: 0.5 seconds
/// - retryable statuses: 408, 429, 500, 502, 503, 504
/// - retryable methods: GET
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    retries: u32,

    /// Base of the exponential backoff, in seconds.
    backoff_factor: f64,

    /// Statuses that count as transient.
    retryable_statuses: &'static [u16],

    /// Methods that are safe to repeat.
    retryable_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_BACKOFF_FACTOR)
    }
}

impl RetryPolicy {
    /// Creates a policy with the given retry count and backoff factor.
    ///
    /// A negative or non-finite backoff factor is treated as zero.
    #[must_use]
    pub fn new(retries: u32, backoff_factor: f64) -> Self {
        let backoff_factor = if backoff_factor.is_finite() && backoff_factor > 0.0 {
            backoff_factor
        } else {
            0.0
        };
        Self {
            retries,
            backoff_factor,
            retryable_statuses: &RETRYABLE_STATUSES,
            retryable_methods: vec![Method::GET],
        }
    }

    /// Returns the configured retry count.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the maximum number of attempts (the first one plus retries).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Returns the configured backoff factor in seconds.
    #[must_use]
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Returns true if `status` is in the retryable set.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Returns true if requests with `method` may be repeated.
    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retryable_methods.contains(method)
    }

    /// Delay before the `retry`-th retry (1-indexed).
    ///
    /// Formula: `backoff_factor * 2^(retry - 1)` seconds, capped at the max backoff.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor == 0.0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = (self.backoff_factor * 2f64.powi(exponent)).min(MAX_BACKOFF.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(MAX_BACKOFF)
    }

    /// Classifies a failed attempt.
    ///
    /// # Classification
    ///
    /// | Error | Type |
    /// |-------|------|
    /// | Timeout | Transient |
    /// | Network (connect, reset) | Transient |
    /// | Network (TLS) | Permanent |
    /// | Body read | Transient |
    /// | HTTP 429 (if retryable) | RateLimited |
    /// | HTTP status in retryable set | Transient |
    /// | Other HTTP status | Permanent |
    /// | IO, invalid URL, empty body | Permanent |
    #[must_use]
    pub fn classify(&self, error: &DownloadError) -> FailureType {
        match error {
            DownloadError::HttpStatus { status, .. } if self.is_retryable_status(*status) => {
                if *status == 429 {
                    FailureType::RateLimited
                } else {
                    FailureType::Transient
                }
            }
            DownloadError::Network { source, .. } if is_tls_error(source) => {
                FailureType::Permanent
            }
            DownloadError::Timeout { .. }
            | DownloadError::Network { .. }
            | DownloadError::BodyRead { .. } => FailureType::Transient,
            DownloadError::HttpStatus { .. }
            | DownloadError::Io { .. }
            | DownloadError::InvalidUrl { .. }
            | DownloadError::EmptyBody { .. } => FailureType::Permanent,
        }
    }

    /// Determines whether to retry after a failed attempt.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(level = "debug", skip(self), fields(max_attempts = self.max_attempts()))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts() {
            debug!(attempt, max = self.max_attempts(), "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts()),
            };
        }

        RetryDecision::Retry {
            delay: self.backoff_delay(attempt),
            attempt: attempt + 1,
        }
    }

    /// Server-mandated delay for a failed attempt, if the response carried one.
    ///
    /// Only honored for 429 and 503 responses.
    #[must_use]
    pub fn retry_after_delay(&self, error: &DownloadError) -> Option<Duration> {
        match error {
            DownloadError::HttpStatus {
                status,
                retry_after: Some(header),
                ..
            } if RETRY_AFTER_STATUSES.contains(status) => parse_retry_after(header),
            _ => None,
        }
    }
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date).
///
/// Values above one hour are capped; dates in the past yield zero.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER));
    }
    let date = httpdate::parse_http_date(value).ok()?;
    let delay = date
        .duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(delay.min(MAX_RETRY_AFTER))
}

/// Checks if a reqwest error is a TLS/certificate error.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let error_string = error.to_string().to_lowercase();
    error_string.contains("certificate")
        || error_string.contains("tls")
        || error_string.contains("ssl")
        || error_string.contains("handshake")
}

/// Waits between retry attempts.
///
/// Injected into the transport so tests can observe backoff delays without
/// actually sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync + fmt::Debug {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
