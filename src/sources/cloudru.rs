//! Cloud.ru Artifact Registry client.
//!
//! Every call is authenticated with a bearer token from the IAM service; see
//! [`TokenManager`] for the refresh-on-401 behaviour.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{secs, RegistryConfig, RegistryCredentials};
use crate::gateway::{GatewayError, IamAuthenticator, SourceError, TokenManager};
use crate::models::RegistryType;
use crate::utils::HttpClient;

const SOURCE_ID: &str = "cloud.ru artifact registry";

#[derive(Debug)]
pub struct ArtifactRegistryClient {
    http: HttpClient,
    api_url: String,
    project_id: String,
    timeout: Duration,
    tokens: TokenManager,
}

impl ArtifactRegistryClient {
    pub fn new(http: HttpClient, config: &RegistryConfig, credentials: RegistryCredentials) -> Self {
        let authenticator = IamAuthenticator::new(
            http.clone(),
            &config.iam_url,
            credentials.key_id,
            credentials.secret,
        );
        Self::with_token_manager(
            http,
            config,
            credentials.project_id,
            TokenManager::new(SOURCE_ID, Arc::new(authenticator)),
        )
    }

    pub fn with_token_manager(
        http: HttpClient,
        config: &RegistryConfig,
        project_id: impl Into<String>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            timeout: secs(config.timeout_secs),
            tokens,
        }
    }

    pub async fn list_registries(&self) -> Result<Value, GatewayError> {
        let path = format!("/v1/projects/{}/registries", self.project_id);
        self.request(Method::GET, &path, &[("pageSize", "10")], None)
            .await
    }

    pub async fn get_registry(&self, registry_id: &str) -> Result<Value, GatewayError> {
        let path = format!(
            "/v1/projects/{}/registries/{}",
            self.project_id,
            urlencoding::encode(registry_id)
        );
        self.request(Method::GET, &path, &[], None).await
    }

    pub async fn create_registry(
        &self,
        name: &str,
        registry_type: RegistryType,
        is_public: bool,
    ) -> Result<Value, GatewayError> {
        info!(name, %registry_type, is_public, "Creating registry");
        let path = format!("/v1/projects/{}/registries", self.project_id);
        let body = serde_json::json!({
            "name": name,
            "registryType": registry_type.as_str(),
            "isPublic": is_public,
        });
        self.request(Method::POST, &path, &[], Some(body)).await
    }

    pub async fn delete_registry(&self, registry_id: &str) -> Result<Value, GatewayError> {
        info!(registry_id, "Deleting registry");
        let path = format!(
            "/v1/projects/{}/registries/{}",
            self.project_id,
            urlencoding::encode(registry_id)
        );
        self.request(Method::DELETE, &path, &[], None).await
    }

    /// Retention operations recorded for a registry
    pub async fn registry_operations(&self, registry_id: &str) -> Result<Value, GatewayError> {
        let path = format!(
            "/v1/projects/registry/{}/retention/operations",
            urlencoding::encode(registry_id)
        );
        let project_id = self.project_id.clone();
        self.request(
            Method::GET,
            &path,
            &[("projectId", project_id.as_str()), ("pageSize", "100")],
            None,
        )
        .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%method, url = %url, "Artifact registry request");

        let response = self
            .tokens
            .send(|| {
                let mut request = self
                    .http
                    .client()
                    .request(method.clone(), &url)
                    .query(query)
                    .timeout(self.timeout);
                if let Some(body) = &body {
                    request = request.json(body);
                }
                request
            })
            .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?;

        if !status.is_success() {
            return Err(GatewayError::upstream(
                SOURCE_ID,
                SourceError::status(status.as_u16(), &error_message(&text)),
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::upstream(SOURCE_ID, e))
    }
}

/// The `message` of a JSON error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
