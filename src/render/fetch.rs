//! Fetched pages.

use std::fmt::Write as _;

use super::push_line;
use crate::models::{or_unknown, PageText, UNKNOWN};

pub fn page(page: &PageText) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", page.url);
    let _ = writeln!(out, "Status: {}", page.status);
    if let Some(title) = &page.title {
        let _ = writeln!(out, "Title: {}", title);
    }
    let _ = writeln!(out, "Content-Type: {}", or_unknown(&page.content_type));
    push_line(&mut out, "Last-Modified", page.last_modified.as_deref());
    let _ = writeln!(out, "Size: {} bytes", page.length);

    if !page.is_html() {
        let _ = writeln!(
            out,
            "\nWarning: the response is not HTML; {} shown as-is.",
            if page.truncated { "a preview is" } else { "the body is" }
        );
    }

    let content = if page.content.trim().is_empty() {
        UNKNOWN
    } else {
        page.content.as_str()
    };
    let _ = write!(out, "\n{}", content);
    out
}
