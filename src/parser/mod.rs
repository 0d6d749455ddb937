//! Link file parsing.
//!
//! A link file holds one URL per line. Lines starting with `#` are comments,
//! blank lines are ignored, and anything after the first delimiter (`,` or `;`
//! by default) is treated as free-form metadata and dropped.
//!
//! # Example
//!
//! ```
//! use imgdl_core::parser::LinkParser;
//!
//! let text = "# photos\nhttps://example.com/a.jpg\nhttps://example.com/b.png, cover\nhttps://example.com/a.jpg\n";
//! let links = LinkParser::new().parse(text);
//! assert_eq!(links.urls(), ["https://example.com/a.jpg", "https://example.com/b.png"]);
//! assert_eq!(links.duplicate_count(), 1);
//! ```

mod encoding;
mod error;
mod input;

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, instrument};

pub use encoding::TextEncoding;
pub use error::ParseError;
pub use input::LinkList;

/// Default metadata delimiters.
pub const DEFAULT_DELIMITERS: &[char] = &[',', ';'];

/// Parses link files into a [`LinkList`].
#[derive(Debug, Clone)]
pub struct LinkParser {
    delimiters: Vec<char>,
}

impl Default for LinkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkParser {
    /// Creates a parser with the default `,` and `;` delimiters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delimiters(DEFAULT_DELIMITERS)
    }

    /// Creates a parser with custom metadata delimiters.
    #[must_use]
    pub fn with_delimiters(delimiters: &[char]) -> Self {
        Self {
            delimiters: delimiters.to_vec(),
        }
    }

    /// Parses link text into an ordered, deduplicated URL list.
    ///
    /// Never fails: lines that reduce to nothing are dropped.
    #[must_use]
    pub fn parse(&self, text: &str) -> LinkList {
        let mut urls = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = 0usize;

        for raw in text.split(is_line_boundary) {
            let Some(link) = self.extract_link(raw) else {
                continue;
            };

            if seen.insert(link) {
                urls.push(link.to_string());
            } else {
                duplicates += 1;
                debug!(url = %link, "skipping duplicate link");
            }
        }

        LinkList::new(urls, duplicates)
    }

    /// Reads and parses a link file.
    ///
    /// Undecodable bytes are ignored according to `encoding`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InputFile`] if the file is missing or unreadable.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path, encoding: TextEncoding) -> Result<LinkList, ParseError> {
        let bytes = std::fs::read(path).map_err(|e| ParseError::input_file(path, e))?;
        let links = self.parse(&encoding.decode(&bytes));
        debug!(
            links = links.len(),
            duplicates = links.duplicate_count(),
            %encoding,
            "parsed links file"
        );
        Ok(links)
    }

    /// Reduces one raw line to its URL, or `None` if nothing is left.
    fn extract_link<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let line = match line.find(self.delimiters.as_slice()) {
            Some(pos) => line[..pos].trim(),
            None => line,
        };

        (!line.is_empty()).then_some(line)
    }
}

/// Parses link text with the default parser.
#[must_use]
pub fn parse_links(text: &str) -> LinkList {
    LinkParser::new().parse(text)
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}'..='\u{0c}' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}
