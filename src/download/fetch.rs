//! Single-URL fetch with skip rule and atomic writes.
//!
//! The body is streamed into `<dest>.part` and renamed onto the destination
//! only when it is complete and non-empty. The temp file is owned by a drop
//! guard, so it disappears on every failure path, including task cancellation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::part_path;
use super::observer::DownloadObserver;
use super::registry::DestinationRegistry;
use super::result::DownloadResult;

/// Fetches individual URLs into an output directory.
#[derive(Clone)]
pub struct Fetcher {
    client: HttpClient,
    observer: Arc<dyn DownloadObserver>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher. `observer` receives retry events from the transport.
    #[must_use]
    pub fn new(client: HttpClient, observer: Arc<dyn DownloadObserver>) -> Self {
        Self { client, observer }
    }

    /// Underlying transport.
    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Fetches `url` into `dest_dir`.
    ///
    /// Opens the directory's registry for this single call and persists it
    /// afterwards. Use [`Fetcher::fetch_into`] when fetching many URLs.
    pub async fn fetch(&self, url: &str, dest_dir: &Path) -> DownloadResult {
        if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
            return DownloadResult::failed(url, DownloadError::io(dest_dir, e).to_string());
        }

        let registry = DestinationRegistry::open(dest_dir).await;
        let result = self.fetch_into(url, &registry).await;
        if let Err(e) = registry.persist().await {
            warn!(error = %e, "could not save manifest");
        }
        result
    }

    /// Fetches `url` into the directory managed by `registry`.
    ///
    /// Never fails: every error becomes a `failed` result.
    #[instrument(skip(self, registry))]
    pub async fn fetch_into(&self, url: &str, registry: &DestinationRegistry) -> DownloadResult {
        match self.try_fetch(url, registry).await {
            Ok(result) => result,
            Err(error) => {
                debug!(error = %error, "fetch failed");
                DownloadResult::failed(url, error.to_string())
            }
        }
    }

    async fn try_fetch(
        &self,
        url: &str,
        registry: &DestinationRegistry,
    ) -> Result<DownloadResult, DownloadError> {
        let parsed = validate_url(url)?;
        let destination = registry.reserve(url);

        if is_non_empty_file(&destination).await {
            debug!(path = %destination.display(), "destination exists, skipping");
            registry.record(url, &destination);
            return Ok(DownloadResult::skipped(url, destination));
        }

        match self.download(&parsed, &destination).await {
            Ok(bytes) => {
                registry.record(url, &destination);
                Ok(DownloadResult::downloaded(url, destination, bytes))
            }
            Err(error) => {
                registry.release(url, &destination);
                Err(error)
            }
        }
    }

    async fn download(&self, url: &Url, destination: &Path) -> Result<u64, DownloadError> {
        let part = PartFile::new(part_path(destination));
        let bytes = self
            .client
            .fetch_to_file(url, part.path(), self.observer.as_ref())
            .await?;

        if bytes == 0 {
            return Err(DownloadError::empty_body(url.as_str()));
        }

        tokio::fs::rename(part.path(), destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        part.disarm();
        Ok(bytes)
    }
}

/// Accepts only absolute `http` and `https` URLs.
fn validate_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed),
        _ => Err(DownloadError::invalid_url(url)),
    }
}

async fn is_non_empty_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Removes the temp file on drop unless disarmed.
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.armed && std::fs::remove_file(&self.path).is_ok() {
            debug!(path = %self.path.display(), "removed partial file");
        }
    }
}
