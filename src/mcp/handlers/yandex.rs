//! `search_web` over the Yandex Cloud Search API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::render;
use crate::sources::yandex::MAX_PAGE_SIZE;
use crate::sources::YandexSearchClient;
use crate::utils::{clamp_count, require_non_empty};

#[derive(Debug, Deserialize)]
struct YandexParams {
    #[serde(default)]
    query: String,
    #[serde(default = "default_page_size")]
    page_size: i64,
    #[serde(default)]
    page_number: i64,
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug)]
struct YandexHandler {
    client: Arc<YandexSearchClient>,
}

#[async_trait]
impl ToolHandler for YandexHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let params: YandexParams = parse_args(args)?;
        let query = require_non_empty("query", &params.query)?;
        let page_size = clamp_count(params.page_size, 1, MAX_PAGE_SIZE);
        let page_number = clamp_count(params.page_number, 0, u32::MAX);

        let docs = self.client.search(&query, page_size, page_number).await?;
        Ok(Value::String(render::search::yandex(&query, page_number, &docs)))
    }
}

pub fn tools(client: Arc<YandexSearchClient>) -> Vec<Tool> {
    vec![Tool::new(
        "search_web",
        "Search the web through Yandex",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "page_size": {
                    "type": "integer",
                    "description": "Results per page (1-50)",
                    "default": 10
                },
                "page_number": {
                    "type": "integer",
                    "description": "Zero-based page index",
                    "default": 0
                }
            },
            "required": ["query"]
        }),
        YandexHandler { client },
    )]
}
