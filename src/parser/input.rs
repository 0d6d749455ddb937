//! Types representing a parsed link list.

use std::fmt;

/// Ordered, deduplicated list of URLs parsed from a link file.
///
/// The first occurrence of each URL wins and input order is preserved.
/// Comment and blank lines never appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkList {
    urls: Vec<String>,
    duplicate_count: usize,
}

impl LinkList {
    pub(crate) fn new(urls: Vec<String>, duplicate_count: usize) -> Self {
        Self {
            urls,
            duplicate_count,
        }
    }

    /// Returns true if no URLs were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns the number of unique URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns how many repeated lines were dropped.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }

    /// Returns the URLs in input order.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Returns an iterator over the URLs in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }

    /// Consumes the list, returning the URLs.
    #[must_use]
    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

impl<'a> IntoIterator for &'a LinkList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for LinkList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parsed {} links ({} duplicates skipped)",
            self.urls.len(),
            self.duplicate_count
        )
    }
}
