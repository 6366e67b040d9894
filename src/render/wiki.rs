//! Wikipedia articles and listings.

use std::fmt::Write as _;

use super::{push_line, RULE};
use crate::gateway::truncate_chars;
use crate::models::{WikiArticle, WikiLinks, WikiSearchHit, WikiSections, WikiSummary};

/// Article text beyond this many characters is cut
pub const CONTENT_CHARS: usize = 8000;

pub fn not_found(title: &str, language: &str) -> String {
    format!("Article \"{}\" was not found in the {} Wikipedia", title, language)
}

pub fn search_hits(query: &str, language: &str, hits: &[WikiSearchHit]) -> String {
    if hits.is_empty() {
        return format!("No {} Wikipedia articles found for \"{}\"", language, query);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Wikipedia ({}) results for \"{}\": {}", language, query, hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, hit.title);
        if !hit.snippet.is_empty() {
            let _ = writeln!(out, "{}", hit.snippet);
        }
        let _ = writeln!(out, "{}", hit.url);
        if let Some(words) = hit.word_count {
            let _ = writeln!(out, "Words: {}", words);
        }
        let _ = writeln!(out, "{}", RULE);
    }
    out
}

pub fn summary(summary: &WikiSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.title);
    push_line(&mut out, "Description", summary.description.as_deref());
    if let Some((lat, lon)) = summary.coordinates {
        let _ = writeln!(out, "Coordinates: {:.4}, {:.4}", lat, lon);
    }
    if let Some(extract) = summary.extract.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "\n{}\n", extract);
    }
    push_line(&mut out, "Image", summary.thumbnail.as_deref());
    push_line(&mut out, "Read more", summary.url.as_deref());
    out
}

pub fn article(article: &WikiArticle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    push_line(&mut out, "URL", article.url.as_deref());
    if let Some(id) = article.page_id {
        let _ = writeln!(out, "Page id: {}", id);
    }
    push_line(&mut out, "Image", article.thumbnail.as_deref());
    let _ = writeln!(out, "Source: {}", article.source);
    let _ = write!(out, "\n{}", truncate_chars(&article.content, CONTENT_CHARS));
    out
}

pub fn sections(sections: &WikiSections) -> String {
    if sections.sections.is_empty() {
        return format!("\"{}\" has no sections", sections.title);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Sections of \"{}\":", sections.title);
    for section in &sections.sections {
        let indent = "  ".repeat(section.level.saturating_sub(1) as usize);
        match &section.number {
            Some(number) => {
                let _ = writeln!(out, "{}{} {}", indent, number, section.title);
            }
            None => {
                let _ = writeln!(out, "{}{}", indent, section.title);
            }
        }
    }
    out
}

pub fn links(links: &WikiLinks) -> String {
    if links.links.is_empty() {
        return format!("\"{}\" links to no other articles", links.title);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Articles linked from \"{}\" ({}):", links.title, links.links.len());
    for link in &links.links {
        let _ = writeln!(out, "- {}", link);
    }
    out
}
