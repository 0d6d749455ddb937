//! Error types for link file parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a link file.
///
/// Individual malformed lines never produce an error; they are dropped.
/// Only problems with the input as a whole are reported here.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The link file is missing or could not be read.
    #[error("cannot read links file {path}: {source}")]
    InputFile {
        /// Path of the link file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The requested text encoding is not supported.
    #[error("unsupported encoding '{name}'\n  Suggestion: use utf-8, latin-1 or ascii")]
    UnsupportedEncoding {
        /// The encoding name as given.
        name: String,
    },
}

impl ParseError {
    /// Creates an input file error.
    pub fn input_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InputFile {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsupported encoding error.
    pub fn unsupported_encoding(name: impl Into<String>) -> Self {
        Self::UnsupportedEncoding { name: name.into() }
    }

    /// Returns true if the link file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InputFile { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
