//! HTTP client utilities.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use super::validate::is_private_host;

/// Browser-like user agent for endpoints that serve HTML to people
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Client for JSON APIs, identifying itself as this crate
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::build(base_builder(timeout).user_agent(DEFAULT_USER_AGENT))
    }

    /// Client that looks like a desktop browser (HTML pages, scraped endpoints)
    pub fn browser(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::build(browser_builder(timeout))
    }

    /// Browser client for fetching client-supplied URLs.
    ///
    /// Unless `allow_private` is set, every redirect hop is checked with
    /// [`is_private_host`] and a hop into a private network ends the request.
    pub fn guarded_browser(timeout: Duration, allow_private: bool) -> Result<Self, reqwest::Error> {
        if allow_private {
            return Self::browser(timeout);
        }
        let policy = Policy::custom(|attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt.url().host_str().map_or(true, is_private_host) {
                attempt.error("redirect to a private or loopback address refused")
            } else {
                attempt.follow()
            }
        });
        Self::build(browser_builder(timeout).redirect(policy))
    }

    /// JSON API client that can skip certificate verification
    pub fn with_tls_verification(timeout: Duration, verify: bool) -> Result<Self, reqwest::Error> {
        Self::build(
            base_builder(timeout)
                .user_agent(DEFAULT_USER_AGENT)
                .danger_accept_invalid_certs(!verify),
        )
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn build(builder: ClientBuilder) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Arc::new(builder.build()?),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }
}

fn base_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(Policy::limited(MAX_REDIRECTS))
}

fn browser_builder(timeout: Duration) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    base_builder(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_browser_client_sends_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", BROWSER_USER_AGENT)
            .match_header("accept-language", "en-US,en;q=0.9")
            .with_body("ok")
            .create_async()
            .await;

        let client = HttpClient::browser(Duration::from_secs(5)).unwrap();
        let body = client.get(&server.url()).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_client_identifies_crate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .create_async()
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        client.get(&server.url()).send().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_guarded_browser_refuses_private_redirect() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("http://localhost:{}/internal", server.socket_address().port());
        server
            .mock("GET", "/start")
            .with_status(302)
            .with_header("location", &target)
            .create_async()
            .await;
        let internal = server
            .mock("GET", "/internal")
            .expect(0)
            .create_async()
            .await;

        let client = HttpClient::guarded_browser(Duration::from_secs(5), false).unwrap();
        let err = client
            .get(&format!("{}/start", server.url()))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_redirect());
        internal.assert_async().await;
    }

    #[tokio::test]
    async fn test_guarded_browser_follows_when_private_allowed() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/internal", server.url());
        server
            .mock("GET", "/start")
            .with_status(302)
            .with_header("location", &target)
            .create_async()
            .await;
        server
            .mock("GET", "/internal")
            .with_body("inside")
            .create_async()
            .await;

        let client = HttpClient::guarded_browser(Duration::from_secs(5), true).unwrap();
        let body = client
            .get(&format!("{}/start", server.url()))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "inside");
    }
}
