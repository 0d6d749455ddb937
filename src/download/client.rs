//! HTTP transport for downloading files.
//!
//! [`HttpClient`] wraps one pooled `reqwest::Client` together with the
//! [`RetryPolicy`] it applies. Retries are transparent: callers see either the
//! byte count of a complete body or the error of the last attempt.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{DEFAULT_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST, WRITE_BUFFER_SIZE};
use super::error::DownloadError;
use super::observer::DownloadObserver;
use super::retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::user_agent;

/// Construction settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Bounds the connect phase and each read of the response.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            user_agent: user_agent::default_user_agent(),
            pool_max_idle_per_host: POOL_MAX_IDLE_PER_HOST,
        }
    }
}

/// HTTP client for downloading files with streaming support and retries.
///
/// Create once and share: the inner `reqwest::Client` pools connections and
/// is released when the last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use imgdl_core::download::{ClientSettings, HttpClient, NoopObserver, RetryPolicy};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&ClientSettings::default(), RetryPolicy::default())?;
/// let url = Url::parse("https://example.com/a.jpg")?;
/// let bytes = client
///     .fetch_to_file(&url, Path::new("downloads/a.jpg.part"), &NoopObserver)
///     .await?;
/// println!("received {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Creates a client that waits between retries with the tokio timer.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend or resolver cannot be
    /// initialized.
    pub fn new(settings: &ClientSettings, policy: RetryPolicy) -> Result<Self, reqwest::Error> {
        Self::with_sleeper(settings, policy, Arc::new(TokioSleeper))
    }

    /// Creates a client with a custom [`Sleeper`].
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend or resolver cannot be
    /// initialized.
    pub fn with_sleeper(
        settings: &ClientSettings,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .read_timeout(settings.timeout)
            .gzip(true)
            .user_agent(settings.user_agent.as_str())
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build()?;
        Ok(Self {
            client,
            policy,
            sleeper,
        })
    }

    /// Retry policy applied by this client.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Downloads `url` into `part_path`, retrying per the policy.
    ///
    /// Each attempt truncates `part_path` and streams the body into it. On
    /// error the file may hold a partial body; removing it is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    #[instrument(skip(self, url, part_path, observer), fields(url = %url))]
    pub async fn fetch_to_file(
        &self,
        url: &Url,
        part_path: &Path,
        observer: &dyn DownloadObserver,
    ) -> Result<u64, DownloadError> {
        let mut attempt = 1;
        loop {
            let error = match self.attempt(url, part_path).await {
                Ok(bytes) => {
                    debug!(bytes, attempt, "body received");
                    return Ok(bytes);
                }
                Err(error) => error,
            };

            if !self.policy.allows_method(&Method::GET) {
                return Err(error);
            }

            match self
                .policy
                .should_retry(self.policy.classify(&error), attempt)
            {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    let delay = self.policy.retry_after_delay(&error).unwrap_or(delay);
                    observer.on_retry(url.as_str(), attempt, delay, &error);
                    self.sleeper.sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, error = %error, "giving up");
                    return Err(error);
                }
            }
        }
    }

    async fn attempt(&self, url: &Url, part_path: &Path) -> Result<u64, DownloadError> {
        let response = self.send(url).await?;
        let file = File::create(part_path)
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;
        stream_to_file(file, response, url.as_str(), part_path).await
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .request(Method::GET, url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url.as_str())
                } else {
                    DownloadError::network(url.as_str(), e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(DownloadError::http_status_with_retry_after(
                url.as_str(),
                status.as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }
}

/// Streams the response body through a buffered writer, returning bytes written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::body_read(url, bytes_written, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
