//! Yandex Cloud Search API (v2) client.
//!
//! Results come back as an XML document, base64-encoded in the `rawData`
//! field of a JSON envelope.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::config::{secs, YandexConfig, YandexCredentials};
use crate::gateway::{ensure_success, GatewayError, SourceError};
use crate::models::YandexDoc;
use crate::normalize::parse_documents;
use crate::utils::HttpClient;

const SOURCE_ID: &str = "yandex search";

/// Results per page accepted by the API
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchEnvelope {
    raw_data: Option<String>,
}

pub struct YandexSearchClient {
    http: HttpClient,
    search_url: String,
    api_key: String,
    folder_id: String,
    verify_ssl: bool,
    timeout: Duration,
}

impl std::fmt::Debug for YandexSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexSearchClient")
            .field("search_url", &self.search_url)
            .field("folder_id", &self.folder_id)
            .field("verify_ssl", &self.verify_ssl)
            .finish_non_exhaustive()
    }
}

impl YandexSearchClient {
    pub fn new(http: HttpClient, config: &YandexConfig, credentials: YandexCredentials) -> Self {
        Self {
            http,
            search_url: config.search_url.clone(),
            api_key: credentials.api_key,
            folder_id: credentials.folder_id,
            verify_ssl: credentials.verify_ssl,
            timeout: secs(config.timeout_secs),
        }
    }

    /// Request body for one page of results
    pub fn request_body(&self, query: &str, page_size: u32, page_number: u32) -> Value {
        json!({
            "query": {
                "searchType": "SEARCH_TYPE_COM",
                "queryText": query,
                "familyMode": "FAMILY_MODE_NONE",
                "fixTypoMode": "FIX_TYPO_MODE_OFF",
            },
            "groupSpec": {
                "groupMode": "GROUP_MODE_FLAT",
                "groupsOnPage": page_size.clamp(1, MAX_PAGE_SIZE),
            },
            "maxPassages": 2,
            "l10n": "LOCALIZATION_EN",
            "folderId": self.folder_id,
            "page": page_number.to_string(),
        })
    }

    pub async fn search(
        &self,
        query: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<Vec<YandexDoc>, GatewayError> {
        info!(query, page_size, page_number, "Yandex search");
        self.search_inner(query, page_size, page_number)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, self.with_tls_hint(e)))
    }

    async fn search_inner(
        &self,
        query: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<Vec<YandexDoc>, SourceError> {
        let response = self
            .http
            .post(&self.search_url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&self.request_body(query, page_size, page_number))
            .timeout(self.timeout)
            .send()
            .await?;

        let envelope: SearchEnvelope = ensure_success(response).await?.json().await?;
        let raw = envelope
            .raw_data
            .filter(|r| !r.is_empty())
            .ok_or_else(|| SourceError::rejected("no rawData in response"))?;

        let xml = STANDARD.decode(raw.trim())?;
        let xml = String::from_utf8(xml)
            .map_err(|e| SourceError::Parse(format!("rawData is not UTF-8: {}", e)))?;

        parse_documents(&xml)
    }

    fn with_tls_hint(&self, error: SourceError) -> SourceError {
        match error {
            SourceError::Network(message) if self.verify_ssl && is_tls_failure(&message) => {
                SourceError::Network(format!(
                    "{} (set YANDEX_VERIFY_SSL=false to skip certificate checks in development)",
                    message
                ))
            }
            other => other,
        }
    }
}

fn is_tls_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    ["certificate", "ssl", "tls", "handshake"]
        .iter()
        .any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: String) -> YandexSearchClient {
        YandexSearchClient::new(
            HttpClient::new(Duration::from_secs(5)).unwrap(),
            &YandexConfig {
                search_url: url,
                timeout_secs: 5,
            },
            YandexCredentials {
                api_key: "secret-key".into(),
                folder_id: "folder-1".into(),
                verify_ssl: true,
            },
        )
    }

    #[test]
    fn test_request_body_clamps_page_size() {
        let client = client("http://unused".into());
        let body = client.request_body("rust", 500, 2);
        assert_eq!(body["groupSpec"]["groupsOnPage"], 50);
        assert_eq!(body["page"], "2");
        assert_eq!(body["folderId"], "folder-1");
    }

    #[tokio::test]
    async fn test_search_decodes_raw_data() {
        let xml = "<yandexsearch><response><results><grouping><group><doc><url>https://example.com/</url><title>Example</title></doc></group></grouping></results></response></yandexsearch>";
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/web/search")
            .match_header("authorization", "Api-Key secret-key")
            .match_body(Matcher::PartialJson(json!({"query": {"queryText": "example"}})))
            .with_header("content-type", "application/json")
            .with_body(json!({ "rawData": STANDARD.encode(xml) }).to_string())
            .expect(1)
            .create_async()
            .await;

        let docs = client(format!("{}/v2/web/search", server.url()))
            .search("example", 10, 0)
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title.as_deref(), Some("Example"));
    }

    #[tokio::test]
    async fn test_tls_failure_suggests_verify_ssl_flag() {
        // https against a plain-HTTP listener fails during the handshake
        let server = mockito::Server::new_async().await;
        let url = format!("https://{}/v2/web/search", server.host_with_port());

        let err = client(url).search("example", 10, 0).await.unwrap_err();
        match err {
            GatewayError::Upstream {
                error: SourceError::Network(message),
                ..
            } => assert!(message.contains("YANDEX_VERIFY_SSL"), "{}", message),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tls_hint_only_for_tls_failures() {
        let client = client("http://unused".into());
        let hinted = client.with_tls_hint(SourceError::Network(
            "error sending request: SSL routines::wrong version number".into(),
        ));
        assert!(hinted.to_string().contains("YANDEX_VERIFY_SSL"));

        let plain = client.with_tls_hint(SourceError::Network("connection refused".into()));
        assert!(!plain.to_string().contains("YANDEX_VERIFY_SSL"));
    }

    #[tokio::test]
    async fn test_missing_raw_data_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/web/search")
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let err = client(format!("{}/v2/web/search", server.url()))
            .search("example", 10, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream { error: SourceError::Rejected(_), .. }
        ));
    }
}
