//! Web, news, image and video search hits.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Web,
    News,
    Image,
    Video,
}

impl SearchKind {
    /// Largest number of hits a single call may return
    pub fn max_results(self) -> u32 {
        match self {
            SearchKind::Web => 50,
            SearchKind::News => 30,
            SearchKind::Image | SearchKind::Video => 20,
        }
    }
}

/// Kind-specific details of a hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HitExtras {
    None,
    News {
        date: Option<String>,
        publisher: Option<String>,
    },
    Image {
        image_url: Option<String>,
        thumbnail: Option<String>,
        width: Option<i64>,
        height: Option<i64>,
    },
    Video {
        duration: Option<String>,
        publisher: Option<String>,
        published: Option<String>,
        embed_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub extras: HitExtras,
}

impl SearchHit {
    pub fn web(title: impl Into<String>, url: impl Into<String>, snippet: Option<String>) -> Self {
        Self {
            kind: SearchKind::Web,
            title: title.into(),
            url: url.into(),
            snippet,
            extras: HitExtras::None,
        }
    }
}

/// Hits for one query, as answered by a single provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub kind: SearchKind,
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub source: String,
}

/// One organic result from Yandex search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YandexDoc {
    pub url: String,
    pub title: Option<String>,
    /// Passages joined with single spaces
    pub snippet: Option<String>,
    pub extended_text: Option<String>,
    pub saved_copy_url: Option<String>,
}
