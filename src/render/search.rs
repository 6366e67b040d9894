//! Search results from DuckDuckGo and Yandex.

use std::fmt::Write as _;

use super::{push_line, RULE};
use crate::gateway::truncate_chars;
use crate::models::{HitExtras, SearchKind, SearchResults, YandexDoc, UNKNOWN};

const TITLE_CHARS: usize = 150;
const SNIPPET_CHARS: usize = 300;

fn kind_label(kind: SearchKind) -> &'static str {
    match kind {
        SearchKind::Web => "Web results",
        SearchKind::News => "News",
        SearchKind::Image => "Images",
        SearchKind::Video => "Videos",
    }
}

pub fn results(results: &SearchResults) -> String {
    if results.hits.is_empty() {
        return format!("No results for \"{}\"", results.query);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} for \"{}\"", kind_label(results.kind), results.query);
    let _ = writeln!(out, "Found: {}", results.hits.len());
    let _ = writeln!(out, "Source: {}", results.source);

    for (i, hit) in results.hits.iter().enumerate() {
        let title = if hit.title.is_empty() { UNKNOWN } else { hit.title.as_str() };
        let _ = writeln!(out, "\n{}. {}", i + 1, truncate_chars(title, TITLE_CHARS));
        let _ = writeln!(out, "{}", hit.url);
        if let Some(snippet) = &hit.snippet {
            let _ = writeln!(out, "{}", truncate_chars(snippet, SNIPPET_CHARS));
        }

        match &hit.extras {
            HitExtras::None => {}
            HitExtras::News { date, publisher } => {
                push_line(&mut out, "Date", date.as_deref());
                push_line(&mut out, "Publisher", publisher.as_deref());
            }
            HitExtras::Image {
                image_url,
                width,
                height,
                ..
            } => {
                push_line(&mut out, "Image", image_url.as_deref());
                if let (Some(w), Some(h)) = (width, height) {
                    let _ = writeln!(out, "Size: {}x{}", w, h);
                }
            }
            HitExtras::Video {
                duration,
                publisher,
                published,
                ..
            } => {
                push_line(&mut out, "Duration", duration.as_deref());
                push_line(&mut out, "Channel", publisher.as_deref());
                push_line(&mut out, "Published", published.as_deref());
            }
        }
        let _ = writeln!(out, "{}", RULE);
    }
    out
}

/// Yandex documents for one page of a query
pub fn yandex(query: &str, page_number: u32, docs: &[YandexDoc]) -> String {
    if docs.is_empty() {
        return format!("No results for \"{}\"", query);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Yandex results for \"{}\" (page {})", query, page_number);
    let _ = writeln!(out, "Found: {}", docs.len());

    for (i, doc) in docs.iter().enumerate() {
        let title = doc.title.as_deref().unwrap_or(UNKNOWN);
        let _ = writeln!(out, "\n{}. {}", i + 1, truncate_chars(title, TITLE_CHARS));
        let _ = writeln!(out, "{}", doc.url);
        if let Some(snippet) = &doc.snippet {
            let _ = writeln!(out, "{}", truncate_chars(snippet, SNIPPET_CHARS));
        }
        if let Some(extended) = &doc.extended_text {
            let _ = writeln!(out, "More: {}", truncate_chars(extended, SNIPPET_CHARS));
        }
        push_line(&mut out, "Cached copy", doc.saved_copy_url.as_deref());
        let _ = writeln!(out, "{}", RULE);
    }
    out
}
