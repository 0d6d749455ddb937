//! Per-directory registry of destination names.
//!
//! The registry hands out destination paths to concurrent fetches. A name
//! belongs to exactly one URL: claims are made with an atomic `DashMap` entry,
//! so two URLs that sanitize to the same filename never both receive it. The
//! claims are persisted to a small JSON manifest in the output directory, which
//! lets a later run map each URL back to the file it produced.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::constants::MANIFEST_FILENAME;
use super::filename::{candidate_filename, hashed_filename};

const MANIFEST_VERSION: u32 = 1;

/// Errors raised while persisting the manifest.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Reading or writing the manifest failed.
    #[error("manifest IO error at {path}: {source}")]
    Io {
        /// Manifest path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The manifest could not be serialized.
    #[error("manifest serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Thread-safe map of `filename -> url` for one output directory.
#[derive(Debug)]
pub struct DestinationRegistry {
    dir: PathBuf,
    claims: DashMap<String, String>,
}

impl DestinationRegistry {
    /// Opens the registry for `dir`, loading the manifest if one exists.
    ///
    /// A missing manifest yields an empty registry. An unreadable or corrupt
    /// manifest is logged and ignored.
    pub async fn open(dir: &Path) -> Self {
        let path = dir.join(MANIFEST_FILENAME);
        let claims = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Manifest>(&bytes) {
                Ok(manifest) => {
                    debug!(
                        entries = manifest.entries.len(),
                        path = %path.display(),
                        "loaded manifest"
                    );
                    for (name, url) in manifest.entries {
                        claims.insert(name, url);
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring corrupt manifest"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not read manifest"),
        }

        Self {
            dir: dir.to_path_buf(),
            claims,
        }
    }

    /// Output directory this registry manages.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of claimed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true if no names are claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// URL that owns `filename`, if any.
    #[must_use]
    pub fn owner(&self, filename: &str) -> Option<String> {
        self.claims.get(filename).map(|owner| owner.value().clone())
    }

    /// Claims a destination path for `url`.
    ///
    /// The plain sanitized name is used when it is free (unclaimed and absent
    /// on disk) or already owned by `url`. Otherwise the URL-hash suffixed
    /// name is returned.
    pub fn reserve(&self, url: &str) -> PathBuf {
        let candidate = candidate_filename(url);
        if self.try_claim(&candidate, url) {
            return self.dir.join(candidate);
        }

        let hashed = hashed_filename(&candidate, url);
        debug!(url, candidate = %candidate, hashed = %hashed, "name collision");
        self.claims
            .entry(hashed.clone())
            .or_insert_with(|| url.to_string());
        self.dir.join(hashed)
    }

    /// Marks `path` as produced by `url`.
    pub fn record(&self, url: &str, path: &Path) {
        if let Some(name) = file_name(path) {
            self.claims.insert(name, url.to_string());
        }
    }

    /// Drops the claim `url` holds on `path`.
    pub fn release(&self, url: &str, path: &Path) {
        if let Some(name) = file_name(path) {
            self.claims.remove_if(&name, |_, owner| owner == url);
        }
    }

    /// Writes the manifest atomically (temp file, then rename).
    ///
    /// Only names whose file exists on disk are written.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the manifest cannot be serialized or written.
    pub async fn persist(&self) -> Result<(), RegistryError> {
        let (json, entries) = self.manifest_json()?;
        let (tmp, path) = self.manifest_paths();

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| RegistryError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| RegistryError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(entries, path = %path.display(), "persisted manifest");
        Ok(())
    }

    /// Blocking variant of [`DestinationRegistry::persist`] for use in `Drop`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the manifest cannot be serialized or written.
    pub fn persist_blocking(&self) -> Result<(), RegistryError> {
        let (json, entries) = self.manifest_json()?;
        let (tmp, path) = self.manifest_paths();

        std::fs::write(&tmp, json).map_err(|source| RegistryError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| RegistryError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(entries, path = %path.display(), "persisted manifest");
        Ok(())
    }

    fn manifest_json(&self) -> Result<(Vec<u8>, usize), RegistryError> {
        let entries: BTreeMap<String, String> = self
            .claims
            .iter()
            .filter(|claim| self.dir.join(claim.key()).is_file())
            .map(|claim| (claim.key().clone(), claim.value().clone()))
            .collect();
        let count = entries.len();
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            entries,
        };
        Ok((serde_json::to_vec_pretty(&manifest)?, count))
    }

    fn manifest_paths(&self) -> (PathBuf, PathBuf) {
        (
            self.dir.join(format!("{MANIFEST_FILENAME}.tmp")),
            self.dir.join(MANIFEST_FILENAME),
        )
    }

    fn try_claim(&self, name: &str, url: &str) -> bool {
        match self.claims.entry(name.to_string()) {
            Entry::Occupied(owner) => owner.get() == url,
            Entry::Vacant(slot) => {
                if self.dir.join(name).exists() {
                    false
                } else {
                    slot.insert(url.to_string());
                    true
                }
            }
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
