//! Fetched web pages.

use serde::Serialize;

/// Readable projection of one fetched URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    /// `None` for non-HTML responses
    pub title: Option<String>,
    /// Extracted text, or the leading characters of a non-HTML body
    pub content: String,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    /// Body size in bytes
    pub length: usize,
    /// The content is a cut-down preview
    pub truncated: bool,
}

impl PageText {
    pub fn is_html(&self) -> bool {
        self.title.is_some()
    }
}
