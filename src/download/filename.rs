//! Filename extraction, sanitization, and destination resolution.
//!
//! A destination name is derived from the final path segment of the URL. The
//! result is always a single safe path component inside the output directory.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

use super::constants::{FALLBACK_FILENAME, URL_HASH_LEN};

/// Device names that Windows refuses as file stems.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Returns the percent-decoded final path segment of `url`, ignoring query and fragment.
///
/// Returns an empty string when the URL has no final segment.
#[must_use]
pub fn filename_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end]
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces `\ / : * ? " < > |` and control characters with `_`, strips
/// surrounding whitespace and trailing dots, falls back to `download` when
/// nothing is left, and prefixes `_` to reserved device names.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches(['.', ' ']).trim();
    if trimmed.is_empty() || !is_safe_filename_segment(trimmed) {
        return FALLBACK_FILENAME.to_string();
    }

    if is_reserved_name(trimmed) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Sanitized candidate filename for `url`.
#[must_use]
pub fn candidate_filename(url: &str) -> String {
    sanitize_filename(&filename_from_url(url))
}

/// Hex prefix of the SHA-256 digest of `url`.
#[must_use]
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = String::with_capacity(URL_HASH_LEN);
    for byte in digest.iter().take(URL_HASH_LEN.div_ceil(2)) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex.truncate(URL_HASH_LEN);
    hex
}

/// Inserts `_<hash>` between the stem and extension of `filename`.
#[must_use]
pub fn hashed_filename(filename: &str, url: &str) -> String {
    let hash = url_hash(url);
    match filename.rfind('.') {
        Some(pos) if pos > 0 => format!("{}_{hash}{}", &filename[..pos], &filename[pos..]),
        _ => format!("{filename}_{hash}"),
    }
}

/// Resolves where `url` should be saved inside `dir`.
///
/// Uses the sanitized candidate unless a file already exists there, in which
/// case the URL-hash suffixed name is used instead.
#[must_use]
pub fn resolve_destination(url: &str, dir: &Path) -> PathBuf {
    let candidate = candidate_filename(url);
    let path = dir.join(&candidate);
    if path.exists() {
        dir.join(hashed_filename(&candidate, url))
    } else {
        path
    }
}

/// Appends the temp suffix to a destination path.
pub(crate) fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(super::constants::PART_SUFFIX);
    PathBuf::from(name)
}

fn is_reserved_name(name: &str) -> bool {
    let stem = name.rfind('.').map_or(name, |pos| &name[..pos]);
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

fn is_safe_filename_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
