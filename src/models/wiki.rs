//! Wikipedia records.

use serde::Serialize;

/// Languages the Wikipedia tools accept
pub const WIKI_LANGUAGES: &[&str] = &["ru", "en", "de", "fr", "es", "it", "pt", "ja", "zh"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiSearchHit {
    pub title: String,
    /// Snippet with the search highlight markup removed
    pub snippet: String,
    pub page_id: Option<i64>,
    pub word_count: Option<i64>,
    pub timestamp: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiSummary {
    pub title: String,
    pub description: Option<String>,
    pub extract: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub coordinates: Option<(f64, f64)>,
}

/// Full plain-text article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiArticle {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub page_id: Option<i64>,
    pub thumbnail: Option<String>,
    /// `wikitext` or `extracts`, whichever endpoint produced the text
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiSection {
    pub level: u32,
    pub title: String,
    pub number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiSections {
    pub title: String,
    pub sections: Vec<WikiSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiLinks {
    pub title: String,
    pub links: Vec<String>,
}
