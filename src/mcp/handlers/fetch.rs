//! `fetch_page`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::FetchConfig;
use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::render;
use crate::sources::PageFetcher;
use crate::utils::{require_range, validate_url};

/// Largest per-call timeout a client may ask for
pub const MAX_TIMEOUT_SECS: i64 = 120;

#[derive(Debug, Deserialize)]
struct FetchParams {
    #[serde(default)]
    url: String,
    timeout: Option<i64>,
}

#[derive(Debug)]
struct FetchHandler {
    fetcher: Arc<PageFetcher>,
    default_timeout_secs: u64,
    allow_private_hosts: bool,
}

#[async_trait]
impl ToolHandler for FetchHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let params: FetchParams = parse_args(args)?;
        let url = validate_url(&params.url, self.allow_private_hosts)?;
        let timeout = match params.timeout {
            Some(secs) => require_range("timeout", secs, 1, MAX_TIMEOUT_SECS)? as u64,
            None => self.default_timeout_secs,
        };

        let page = self
            .fetcher
            .fetch(&url, Duration::from_secs(timeout))
            .await?;
        Ok(Value::String(render::fetch::page(&page)))
    }
}

pub fn tools(fetcher: Arc<PageFetcher>, config: &FetchConfig) -> Vec<Tool> {
    vec![Tool::new(
        "fetch_page",
        "Download a web page and return its title and readable text",
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Page URL; https:// is assumed when no scheme is given"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Request timeout in seconds (1-120)",
                    "default": config.default_timeout_secs,
                    "minimum": 1,
                    "maximum": MAX_TIMEOUT_SECS
                }
            },
            "required": ["url"]
        }),
        FetchHandler {
            fetcher,
            default_timeout_secs: config.default_timeout_secs,
            allow_private_hosts: config.allow_private_hosts,
        },
    )]
}
