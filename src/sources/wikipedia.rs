//! Wikipedia through the MediaWiki action API and the REST summary endpoint.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{secs, WikipediaConfig};
use crate::gateway::{ensure_success, GatewayError, Orchestrator, SourceError, UpstreamSource};
use crate::models::{WikiArticle, WikiLinks, WikiSearchHit, WikiSection, WikiSections, WikiSummary};
use crate::normalize::{clean_wikitext, lenient, strip_tags};
use crate::utils::HttpClient;

const SOURCE_ID: &str = "wikipedia";

/// Endpoint an article's text is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentParser {
    /// `action=parse&prop=wikitext`, cleaned of markup
    Wikitext,
    /// `prop=extracts&explaintext`, plain text rendered by the server
    Extracts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiError {
    #[serde(deserialize_with = "lenient::string")]
    code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    info: Option<String>,
}

impl ApiError {
    fn reason(&self) -> String {
        self.info
            .clone()
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "api error".to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    error: Option<ApiError>,
    query: SearchQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    search: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchItem {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    snippet: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pageid: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    wordcount: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryResponse {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    extract: Option<String>,
    content_urls: Option<Value>,
    thumbnail: Option<Thumbnail>,
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnail {
    #[serde(deserialize_with = "lenient::string")]
    source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Coordinates {
    #[serde(deserialize_with = "lenient::float")]
    lat: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParseResponse {
    error: Option<ApiError>,
    parse: ParseBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParseBody {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    wikitext: Option<Value>,
    sections: Vec<SectionItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SectionItem {
    #[serde(deserialize_with = "lenient::integer")]
    toclevel: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    line: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    number: Option<String>,
}

/// `action=query` with `prop=...`; pages are keyed by page id
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PagesResponse {
    query: PagesQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PagesQuery {
    pages: BTreeMap<String, QueryPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryPage {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pageid: Option<i64>,
    missing: Option<Value>,
    #[serde(deserialize_with = "lenient::string")]
    fullurl: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    extract: Option<String>,
    thumbnail: Option<Thumbnail>,
    links: Vec<LinkItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkItem {
    #[serde(deserialize_with = "lenient::string")]
    title: Option<String>,
}

impl PagesQuery {
    /// The single page a `titles=` query asked for, unless it does not exist
    fn into_existing_page(self) -> Option<QueryPage> {
        self.pages
            .into_values()
            .next()
            .filter(|page| page.missing.is_none())
    }
}

#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: HttpClient,
    site_url: String,
    timeout: Duration,
    content_timeout: Duration,
}

impl WikipediaClient {
    pub fn new(http: HttpClient, config: &WikipediaConfig) -> Self {
        Self {
            http,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            timeout: secs(config.timeout_secs),
            content_timeout: secs(config.content_timeout_secs),
        }
    }

    fn site(&self, language: &str) -> String {
        self.site_url.replace("{lang}", language)
    }

    fn api_url(&self, language: &str) -> String {
        format!("{}/w/api.php", self.site(language))
    }

    fn article_url(&self, language: &str, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.site(language),
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, SourceError> {
        debug!(url, "Wikipedia request");
        let response = self
            .http
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        language: &str,
    ) -> Result<Vec<WikiSearchHit>, GatewayError> {
        info!(query, limit, language, "Searching Wikipedia");
        let limit = limit.to_string();
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("srprop", "snippet|titlesnippet|size|wordcount|timestamp"),
            ("utf8", "1"),
        ];

        let data: SearchResponse = self
            .get_json(&self.api_url(language), &params, self.timeout)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?;
        if let Some(error) = data.error {
            return Err(GatewayError::upstream(SOURCE_ID, SourceError::rejected(error.reason())));
        }

        Ok(data
            .query
            .search
            .into_iter()
            .filter_map(|item| {
                let title = item.title?;
                Some(WikiSearchHit {
                    url: self.article_url(language, &title),
                    snippet: item.snippet.as_deref().map(strip_tags).unwrap_or_default(),
                    page_id: item.pageid,
                    word_count: item.wordcount,
                    timestamp: item.timestamp,
                    title,
                })
            })
            .collect())
    }

    /// Lead-section summary; `Ok(None)` when the article does not exist
    pub async fn summary(&self, title: &str, language: &str) -> Result<Option<WikiSummary>, GatewayError> {
        info!(title, language, "Fetching Wikipedia summary");
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.site(language),
            urlencoding::encode(&title.replace(' ', "_"))
        );

        let outcome: Result<SummaryResponse, SourceError> = self.get_json(&url, &[], self.timeout).await;
        let data = match outcome {
            Ok(data) => data,
            Err(SourceError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(GatewayError::upstream(SOURCE_ID, e)),
        };

        let page_url = data
            .content_urls
            .as_ref()
            .and_then(|urls| urls.pointer("/desktop/page"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Some(WikiSummary {
            title: data.title.unwrap_or_else(|| title.to_string()),
            description: data.description,
            extract: data.extract,
            url: page_url,
            thumbnail: data.thumbnail.and_then(|t| t.source),
            coordinates: data.coordinates.and_then(|c| Some((c.lat?, c.lon?))),
        }))
    }

    /// Full article text, from the wikitext when it can be read and from
    /// server-side plain-text extracts otherwise. `Ok(None)` when the article
    /// does not exist.
    pub async fn content(&self, title: &str, language: &str) -> Result<Option<WikiArticle>, GatewayError> {
        info!(title, language, "Fetching Wikipedia article");
        let api = self.api_url(language);
        let orchestrator = Orchestrator::new(
            "wikipedia article",
            vec![
                UpstreamSource::new("wikitext", &api, self.content_timeout, ContentParser::Wikitext),
                UpstreamSource::new("extracts", &api, self.content_timeout, ContentParser::Extracts),
            ],
        );

        orchestrator
            .resolve(|source| async move {
                match source.parser() {
                    ContentParser::Wikitext => self.content_from_wikitext(source, title, language).await,
                    ContentParser::Extracts => self.content_from_extracts(source, title, language).await,
                }
            })
            .await
    }

    async fn content_from_wikitext(
        &self,
        source: &UpstreamSource<ContentParser>,
        title: &str,
        language: &str,
    ) -> Result<Option<WikiArticle>, SourceError> {
        let params = [
            ("action", "parse"),
            ("format", "json"),
            ("page", title),
            ("prop", "wikitext"),
        ];
        let data: ParseResponse = self.get_json(source.base_url(), &params, source.timeout()).await?;
        if let Some(error) = data.error {
            return Err(SourceError::rejected(error.reason()));
        }

        let wikitext = data
            .parse
            .wikitext
            .as_ref()
            .and_then(|w| w.get("*"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if wikitext.trim().is_empty() {
            return Err(SourceError::rejected("empty wikitext"));
        }
        let content = clean_wikitext(wikitext);

        let params = [
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "info|pageimages"),
            ("inprop", "url"),
            ("pithumbsize", "500"),
        ];
        let info: PagesResponse = self.get_json(source.base_url(), &params, source.timeout()).await?;
        let page = info.query.pages.into_values().next().unwrap_or_default();

        Ok(Some(WikiArticle {
            title: data.parse.title.unwrap_or_else(|| title.to_string()),
            content,
            url: page.fullurl.or_else(|| Some(self.article_url(language, title))),
            page_id: page.pageid,
            thumbnail: page.thumbnail.and_then(|t| t.source),
            source: source.id().to_string(),
        }))
    }

    async fn content_from_extracts(
        &self,
        source: &UpstreamSource<ContentParser>,
        title: &str,
        language: &str,
    ) -> Result<Option<WikiArticle>, SourceError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "extracts|info|pageimages"),
            ("explaintext", "1"),
            ("inprop", "url"),
            ("pithumbsize", "500"),
        ];
        let data: PagesResponse = self.get_json(source.base_url(), &params, source.timeout()).await?;

        Ok(data.query.into_existing_page().map(|page| WikiArticle {
            title: page.title.unwrap_or_else(|| title.to_string()),
            content: page.extract.unwrap_or_default(),
            url: page.fullurl.or_else(|| Some(self.article_url(language, title))),
            page_id: page.pageid,
            thumbnail: page.thumbnail.and_then(|t| t.source),
            source: source.id().to_string(),
        }))
    }

    /// Table of contents; `Ok(None)` when the article does not exist
    pub async fn sections(&self, title: &str, language: &str) -> Result<Option<WikiSections>, GatewayError> {
        info!(title, language, "Fetching Wikipedia sections");
        let params = [
            ("action", "parse"),
            ("format", "json"),
            ("page", title),
            ("prop", "sections"),
        ];
        let data: ParseResponse = self
            .get_json(&self.api_url(language), &params, self.timeout)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?;

        if let Some(error) = data.error {
            debug!(title, reason = %error.reason(), "No sections");
            return Ok(None);
        }

        let sections = data
            .parse
            .sections
            .into_iter()
            .map(|s| WikiSection {
                level: s.toclevel.unwrap_or(1).clamp(1, 10) as u32,
                title: s.line.as_deref().map(strip_tags).unwrap_or_default(),
                number: s.number,
            })
            .collect();

        Ok(Some(WikiSections {
            title: data.parse.title.unwrap_or_else(|| title.to_string()),
            sections,
        }))
    }

    /// Up to 50 links to other articles; `Ok(None)` when the article does not exist
    pub async fn links(&self, title: &str, language: &str) -> Result<Option<WikiLinks>, GatewayError> {
        info!(title, language, "Fetching Wikipedia links");
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "links"),
            ("pllimit", "50"),
            ("plnamespace", "0"),
        ];
        let data: PagesResponse = self
            .get_json(&self.api_url(language), &params, self.timeout)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?;

        Ok(data.query.into_existing_page().map(|page| WikiLinks {
            title: page.title.unwrap_or_else(|| title.to_string()),
            links: page.links.into_iter().filter_map(|l| l.title).collect(),
        }))
    }
}
