//! Bearer token caching for authenticated upstreams.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::gateway::GatewayError;
use crate::utils::HttpClient;

/// Exchanges long-lived credentials for a short-lived bearer token
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    async fn authenticate(&self) -> Result<String, GatewayError>;
}

/// Key-id/secret exchange against an IAM token endpoint
pub struct IamAuthenticator {
    http: HttpClient,
    token_url: String,
    key_id: String,
    secret: String,
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("token_url", &self.token_url)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl IamAuthenticator {
    pub fn new(
        http: HttpClient,
        iam_base_url: &str,
        key_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: format!("{}/api/v1/auth/token", iam_base_url.trim_end_matches('/')),
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    async fn authenticate(&self) -> Result<String, GatewayError> {
        debug!(url = %self.token_url, "Requesting access token");

        let response = self
            .http
            .client()
            .post(&self.token_url)
            .json(&serde_json::json!({
                "keyId": self.key_id,
                "secret": self.secret,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("unreadable token response: {}", e)))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Auth("token response has no access_token".to_string()))
    }
}

/// Caches one bearer token per upstream service and refreshes it on demand.
///
/// The cache lock is held across the acquisition, so concurrent callers that
/// find it empty wait for a single authentication instead of racing.
pub struct TokenManager {
    service: String,
    authenticator: Arc<dyn Authenticator>,
    cached: Mutex<Option<String>>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("service", &self.service)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(service: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service: service.into(),
            authenticator,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached token, acquiring one first if the cache is empty
    pub async fn token(&self) -> Result<String, GatewayError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        info!(service = %self.service, "Acquiring access token");
        let token = self.authenticator.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token, but only if it is still the one that was rejected.
    ///
    /// A caller holding an old token must not evict a newer one that another
    /// caller has already obtained.
    pub async fn invalidate(&self, stale: &str) {
        let mut cached = self.cached.lock().await;
        if cached.as_deref() == Some(stale) {
            *cached = None;
        }
    }

    pub async fn has_token(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    /// Send an authenticated request.
    ///
    /// `build` is called once per attempt. A 401 invalidates the token and the
    /// request is repeated exactly once with a fresh one; a second 401 is
    /// reported as [`GatewayError::Auth`]. Any other status is returned as-is.
    pub async fn send<F>(&self, build: F) -> Result<reqwest::Response, GatewayError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let token = self.token().await?;
        let response = self.dispatch(build(), &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!(service = %self.service, "Access token rejected, re-authenticating");
        self.invalidate(&token).await;

        let token = self.token().await?;
        let response = self.dispatch(build(), &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Auth(format!(
                "{} rejected a freshly issued token",
                self.service
            )));
        }
        Ok(response)
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        token: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(self.service.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Sequence {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for Sequence {
        async fn authenticate(&self) -> Result<String, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("tok-{n}"))
        }
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let auth = Arc::new(Sequence::default());
        let manager = TokenManager::new("svc", auth.clone());

        assert!(!manager.has_token().await);
        assert_eq!(manager.token().await.unwrap(), "tok-1");
        assert_eq!(manager.token().await.unwrap(), "tok-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
        assert!(manager.has_token().await);
    }

    #[tokio::test]
    async fn test_invalidate_ignores_newer_token() {
        let auth = Arc::new(Sequence::default());
        let manager = TokenManager::new("svc", auth.clone());

        let first = manager.token().await.unwrap();
        manager.invalidate(&first).await;
        let second = manager.token().await.unwrap();
        assert_eq!(second, "tok-2");

        // a late caller still holding tok-1 must not evict tok-2
        manager.invalidate(&first).await;
        assert_eq!(manager.token().await.unwrap(), "tok-2");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_acquisition() {
        let auth = Arc::new(Sequence::default());
        let manager = Arc::new(TokenManager::new("svc", auth.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.token().await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "tok-1");
        }
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_iam_authenticator_reads_access_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/auth/token")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "keyId": "key",
                "secret": "shh"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"abc","expires_in":3600}"#)
            .create_async()
            .await;

        let http = HttpClient::new(std::time::Duration::from_secs(5)).unwrap();
        let auth = IamAuthenticator::new(http, &server.url(), "key", "shh");
        assert_eq!(auth.authenticate().await.unwrap(), "abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_iam_authenticator_refusal_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/token")
            .with_status(403)
            .with_body("bad key")
            .create_async()
            .await;

        let http = HttpClient::new(std::time::Duration::from_secs(5)).unwrap();
        let auth = IamAuthenticator::new(http, &server.url(), "key", "wrong");
        let err = auth.authenticate().await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }
}
