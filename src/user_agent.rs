//! Default User-Agent string for download requests.

/// Default User-Agent for download requests (identifies the tool and version).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("imgdl/{version} (batch-file-downloader)")
}
