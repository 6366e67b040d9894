//! Web page retrieval.

use reqwest::header::{CONTENT_TYPE, LAST_MODIFIED};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::FetchConfig;
use crate::gateway::{ensure_success, truncate_chars, GatewayError, SourceError};
use crate::models::PageText;
use crate::normalize::extract_text;
use crate::utils::HttpClient;

/// Fetches pages with a browser-like client and reduces them to text
#[derive(Debug, Clone)]
pub struct PageFetcher {
    http: HttpClient,
    preview_chars: usize,
}

impl PageFetcher {
    pub fn new(http: HttpClient, config: &FetchConfig) -> Self {
        Self {
            http,
            preview_chars: config.preview_chars,
        }
    }

    /// GET `url` (redirects followed) and extract its readable text.
    ///
    /// Non-HTML responses come back as a preview of the first characters.
    pub async fn fetch(&self, url: &Url, timeout: Duration) -> Result<PageText, GatewayError> {
        let host = url.host_str().unwrap_or("upstream").to_string();
        info!(url = %url, timeout_secs = timeout.as_secs(), "Fetching page");

        self.fetch_inner(url, timeout)
            .await
            .map_err(|e| GatewayError::upstream(host, e))
    }

    async fn fetch_inner(&self, url: &Url, timeout: Duration) -> Result<PageText, SourceError> {
        let response = self
            .http
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = header_value(&response, CONTENT_TYPE);
        let last_modified = header_value(&response, LAST_MODIFIED);
        let body = response.text().await?;
        debug!(url = %final_url, bytes = body.len(), "Page received");

        let is_html = content_type.as_deref().is_some_and(|ct| {
            let ct = ct.to_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        });

        let (title, content, truncated) = if is_html {
            let extracted = extract_text(&body);
            (Some(extracted.title), extracted.content, false)
        } else {
            let truncated = body.chars().count() > self.preview_chars;
            (None, truncate_chars(&body, self.preview_chars), truncated)
        };

        Ok(PageText {
            url: final_url,
            status,
            title,
            content,
            content_type,
            last_modified,
            length: body.len(),
            truncated,
        })
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(
            HttpClient::browser(Duration::from_secs(5)).unwrap(),
            &FetchConfig {
                preview_chars: 10,
                ..FetchConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_html_page_is_extracted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/article")
            .with_header("content-type", "text/html; charset=utf-8")
            .with_header("last-modified", "Wed, 01 May 2024 10:00:00 GMT")
            .with_body("<html><head><title>News</title></head><body><nav>Menu</nav><article>Story text</article></body></html>")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/article", server.url())).unwrap();
        let page = fetcher().fetch(&url, Duration::from_secs(5)).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.title.as_deref(), Some("News"));
        assert_eq!(page.content, "Story text");
        assert_eq!(page.last_modified.as_deref(), Some("Wed, 01 May 2024 10:00:00 GMT"));
        assert!(page.is_html());
    }

    #[tokio::test]
    async fn test_non_html_is_previewed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data.json")
            .with_header("content-type", "application/json")
            .with_body(r#"{"key": "a long value"}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/data.json", server.url())).unwrap();
        let page = fetcher().fetch(&url, Duration::from_secs(5)).await.unwrap();

        assert!(!page.is_html());
        assert!(page.truncated);
        assert_eq!(page.content, r#"{"key": "a..."#);
    }

    #[tokio::test]
    async fn test_http_error_names_the_host() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/missing").with_status(404).create_async().await;

        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetcher().fetch(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream { ref source_id, error: SourceError::Status { status: 404, .. } } if source_id == "127.0.0.1"
        ));
    }
}
