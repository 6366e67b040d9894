//! DuckDuckGo search.
//!
//! Web results are scraped from the HTML front end, falling back to the lite
//! front end. News, images and videos come from the JSON endpoints behind the
//! main site, which require a `vqd` token taken from a regular results page.

use regex::Regex;
use reqwest::header::REFERER;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::{secs, SearchConfig};
use crate::gateway::{ensure_success, GatewayError, Orchestrator, SourceError, UpstreamSource};
use crate::models::{HitExtras, SearchHit, SearchKind, SearchResults};
use crate::normalize::{clean_text, lenient, strip_tags};
use crate::utils::HttpClient;

const API_SOURCE_ID: &str = "duckduckgo";

/// Which front end a web result page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebParser {
    Html,
    Lite,
}

impl WebParser {
    fn path(self) -> &'static str {
        match self {
            WebParser::Html => "/html/",
            WebParser::Lite => "/lite/",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonResults<T> {
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsItem {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    excerpt: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    date: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageItem {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    image: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    thumbnail: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    width: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    height: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoItem {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    content: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    duration: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    published: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    publisher: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    embed_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    http: HttpClient,
    web: Orchestrator<WebParser>,
    api_url: String,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(http: HttpClient, config: &SearchConfig) -> Self {
        let timeout = secs(config.timeout_secs);
        let web = vec![
            UpstreamSource::new("duckduckgo html", &config.html_url, timeout, WebParser::Html),
            UpstreamSource::new("duckduckgo lite", &config.lite_url, timeout, WebParser::Lite),
        ];
        Self {
            http,
            web: Orchestrator::new("web search", web),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn web(
        &self,
        query: &str,
        max_results: u32,
        region: &str,
        time_limit: Option<&str>,
    ) -> Result<SearchResults, GatewayError> {
        info!(query, max_results, region, "Web search");
        let max = max_results.min(SearchKind::Web.max_results()) as usize;

        self.web
            .resolve(|source| async move {
                let mut form = vec![("q", query), ("kl", region)];
                if let Some(df) = time_limit {
                    form.push(("df", df));
                }
                let response = self
                    .http
                    .post(&source.endpoint(source.parser().path()))
                    .header(REFERER, source.endpoint("/"))
                    .form(&form)
                    .timeout(source.timeout())
                    .send()
                    .await?;
                let body = ensure_success(response).await?.text().await?;

                let mut hits = match source.parser() {
                    WebParser::Html => parse_html_results(&body)?,
                    WebParser::Lite => parse_lite_results(&body)?,
                };
                hits.truncate(max);
                debug!(source = source.id(), hits = hits.len(), "Parsed web results");

                Ok(SearchResults {
                    kind: SearchKind::Web,
                    query: query.to_string(),
                    hits,
                    source: source.id().to_string(),
                })
            })
            .await
    }

    pub async fn news(
        &self,
        query: &str,
        max_results: u32,
        region: &str,
        time_limit: Option<&str>,
    ) -> Result<SearchResults, GatewayError> {
        info!(query, max_results, region, "News search");
        let run = async {
            let vqd = self.vqd(query).await?;
            let mut params = vec![
                ("l", region),
                ("o", "json"),
                ("noamp", "1"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("p", "-1"),
            ];
            if let Some(df) = time_limit {
                params.push(("df", df));
            }
            let items: Vec<NewsItem> = self.json_results("/news.js", &params).await?;
            Ok::<_, SourceError>(items.into_iter().filter_map(news_hit).collect())
        };
        self.finish(SearchKind::News, query, max_results, run.await)
    }

    pub async fn images(
        &self,
        query: &str,
        max_results: u32,
        region: &str,
    ) -> Result<SearchResults, GatewayError> {
        info!(query, max_results, region, "Image search");
        let run = async {
            let vqd = self.vqd(query).await?;
            let params = [
                ("l", region),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", ",,,,,"),
                ("p", "1"),
            ];
            let items: Vec<ImageItem> = self.json_results("/i.js", &params).await?;
            Ok::<_, SourceError>(items.into_iter().filter_map(image_hit).collect())
        };
        self.finish(SearchKind::Image, query, max_results, run.await)
    }

    pub async fn videos(
        &self,
        query: &str,
        max_results: u32,
        region: &str,
        time_limit: Option<&str>,
    ) -> Result<SearchResults, GatewayError> {
        info!(query, max_results, region, "Video search");
        let run = async {
            let vqd = self.vqd(query).await?;
            let filter = match time_limit {
                Some(t) => format!("publishedAfter:{},,", t),
                None => ",,".to_string(),
            };
            let params = [
                ("l", region),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", filter.as_str()),
                ("p", "-1"),
            ];
            let items: Vec<VideoItem> = self.json_results("/v.js", &params).await?;
            Ok::<_, SourceError>(items.into_iter().filter_map(video_hit).collect())
        };
        self.finish(SearchKind::Video, query, max_results, run.await)
    }

    fn finish(
        &self,
        kind: SearchKind,
        query: &str,
        max_results: u32,
        outcome: Result<Vec<SearchHit>, SourceError>,
    ) -> Result<SearchResults, GatewayError> {
        let mut hits = outcome.map_err(|e| GatewayError::upstream(API_SOURCE_ID, e))?;
        hits.truncate(max_results.min(kind.max_results()) as usize);
        Ok(SearchResults {
            kind,
            query: query.to_string(),
            hits,
            source: API_SOURCE_ID.to_string(),
        })
    }

    /// Token the JSON endpoints require, scraped from a results page
    async fn vqd(&self, query: &str) -> Result<String, SourceError> {
        let response = self
            .http
            .get(&format!("{}/", self.api_url))
            .query(&[("q", query)])
            .timeout(self.timeout)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        extract_vqd(&body).ok_or_else(|| SourceError::rejected("no vqd token in response"))
    }

    async fn json_results<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<T>, SourceError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let response = self
            .http
            .get(&format!("{}{}", self.api_url, path))
            .header(REFERER, format!("{}/", self.api_url))
            .query(params)
            .timeout(self.timeout)
            .send()
            .await?;
        let data: JsonResults<T> = ensure_success(response).await?.json().await?;
        Ok(data.results)
    }
}

fn vqd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"vqd=["']?([0-9-]+)["']?"#).expect("valid regex"))
}

fn extract_vqd(page: &str) -> Option<String> {
    vqd_pattern()
        .captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector {}: {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Resolve a result link, unwrapping DuckDuckGo's `/l/?uddg=` redirects.
/// Ad links yield `None`.
fn resolve_link(href: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href.trim()).ok()?;

    if url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        if url.path() == "/y.js" {
            return None;
        }
        if url.path().starts_with("/l/") {
            return url
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned());
        }
    }
    Some(url.to_string())
}

/// A results page with nothing on it still counts as an answer when the
/// page says so itself
fn no_results_marker(document: &Html, body: &str) -> Result<bool, SourceError> {
    Ok(document.select(&selector(".no-results")?).next().is_some() || body.contains("No results."))
}

fn parse_html_results(body: &str) -> Result<Vec<SearchHit>, SourceError> {
    let document = Html::parse_document(body);
    let results = selector("div.result")?;
    let title = selector("a.result__a")?;
    let snippet = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for result in document.select(&results) {
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = result.select(&title).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_link) else {
            continue;
        };
        let text = result
            .select(&snippet)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
        hits.push(SearchHit::web(element_text(link), url, text));
    }

    if hits.is_empty() && !no_results_marker(&document, body)? {
        return Err(SourceError::rejected("unrecognised results page"));
    }
    Ok(hits)
}

fn parse_lite_results(body: &str) -> Result<Vec<SearchHit>, SourceError> {
    let document = Html::parse_document(body);
    let links = selector("a.result-link")?;
    let snippets: Vec<String> = document
        .select(&selector("td.result-snippet")?)
        .map(element_text)
        .collect();

    let hits: Vec<SearchHit> = document
        .select(&links)
        .enumerate()
        .filter_map(|(i, link)| {
            let url = link.value().attr("href").and_then(resolve_link)?;
            let text = snippets.get(i).filter(|s| !s.is_empty()).cloned();
            Some(SearchHit::web(element_text(link), url, text))
        })
        .collect();

    if hits.is_empty() && !no_results_marker(&document, body)? {
        return Err(SourceError::rejected("unrecognised results page"));
    }
    Ok(hits)
}

fn news_hit(item: NewsItem) -> Option<SearchHit> {
    let date = item
        .date
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string());
    Some(SearchHit {
        kind: SearchKind::News,
        title: item.title.unwrap_or_default(),
        url: item.url?,
        snippet: item.excerpt.map(|e| strip_tags(&e)),
        extras: HitExtras::News {
            date,
            publisher: item.source,
        },
    })
}

fn image_hit(item: ImageItem) -> Option<SearchHit> {
    let url = item.url.or_else(|| item.image.clone())?;
    Some(SearchHit {
        kind: SearchKind::Image,
        snippet: item.title.clone(),
        title: item.title.unwrap_or_default(),
        url,
        extras: HitExtras::Image {
            image_url: item.image,
            thumbnail: item.thumbnail,
            width: item.width,
            height: item.height,
        },
    })
}

fn video_hit(item: VideoItem) -> Option<SearchHit> {
    Some(SearchHit {
        kind: SearchKind::Video,
        title: item.title.unwrap_or_default(),
        url: item.content?,
        snippet: item.description,
        extras: HitExtras::Video {
            duration: item.duration,
            publisher: item.publisher,
            published: item.published,
            embed_url: item.embed_url,
        },
    })
}
