//! Constants for the download module (timeouts, buffers, retry limits).

use std::time::Duration;

/// Default per-request timeout (30 seconds), applied to connect and each read.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Idle connections kept per host in the shared pool.
pub const POOL_MAX_IDLE_PER_HOST: usize = 20;

/// Write buffer size used when streaming a body to disk (64 KiB).
pub const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Suffix appended to the destination name while the body is streaming.
pub const PART_SUFFIX: &str = ".part";

/// Filename used when a URL has no usable final path segment.
pub const FALLBACK_FILENAME: &str = "download";

/// Number of hex characters of the URL hash used to break name collisions.
pub const URL_HASH_LEN: usize = 10;

/// Upper bound for a single computed backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Manifest recording which URL produced which file in an output directory.
pub const MANIFEST_FILENAME: &str = ".imgdl-manifest.json";
