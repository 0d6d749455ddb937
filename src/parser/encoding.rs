//! Text encodings accepted for link files.
//!
//! Decoding never fails: bytes that are not valid in the chosen encoding are
//! dropped, so a stray byte cannot abort a whole run.

use std::fmt;
use std::str::FromStr;

use super::ParseError;

const UTF8_BOM: char = '\u{feff}';

/// Encoding of a link file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8 (a leading byte order mark is stripped).
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit ASCII: bytes >= 0x80 are dropped.
    Ascii,
}

impl TextEncoding {
    /// Decodes bytes into text, ignoring undecodable bytes.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => {
                let mut text = String::with_capacity(bytes.len());
                for chunk in bytes.utf8_chunks() {
                    text.push_str(chunk.valid());
                }
                match text.strip_prefix(UTF8_BOM) {
                    Some(rest) => rest.to_string(),
                    None => text,
                }
            }
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| char::from(b))
                .collect(),
        }
    }

    /// Returns the canonical label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Ascii => "ascii",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" | "utf-8-sig" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            _ => Err(ParseError::unsupported_encoding(s)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
