//! DuckDuckGo web, news, image and video search tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::models::SearchKind;
use crate::render;
use crate::sources::SearchClient;
use crate::utils::{clamp_count, require_non_empty, require_one_of};

pub const DEFAULT_REGION: &str = "wt-wt";
const TIME_LIMITS: &[&str] = &["d", "w", "m", "y"];

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default = "default_max_results")]
    max_results: i64,
    #[serde(default = "default_region")]
    region: String,
    time_limit: Option<String>,
}

fn default_max_results() -> i64 {
    15
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

#[derive(Debug)]
struct SearchHandler {
    client: Arc<SearchClient>,
    kind: SearchKind,
}

#[async_trait]
impl ToolHandler for SearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let params: SearchParams = parse_args(args)?;
        let query = require_non_empty("query", &params.query)?;
        let max_results = clamp_count(params.max_results, 1, self.kind.max_results());
        let region = match params.region.trim() {
            "" => DEFAULT_REGION,
            region => region,
        };
        let time_limit = match params.time_limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) => Some(require_one_of("time_limit", t, TIME_LIMITS)?),
        };

        let results = match self.kind {
            SearchKind::Web => {
                self.client
                    .web(&query, max_results, region, time_limit)
                    .await?
            }
            SearchKind::News => {
                self.client
                    .news(&query, max_results, region, time_limit.or(Some("w")))
                    .await?
            }
            SearchKind::Image => self.client.images(&query, max_results, region).await?,
            SearchKind::Video => {
                self.client
                    .videos(&query, max_results, region, time_limit)
                    .await?
            }
        };
        Ok(Value::String(render::search::results(&results)))
    }
}

fn schema(kind: SearchKind, with_time_limit: bool) -> Value {
    let mut properties = json!({
        "query": {
            "type": "string",
            "description": "Search query"
        },
        "max_results": {
            "type": "integer",
            "description": format!("Number of results (1-{})", kind.max_results()),
            "default": 15
        },
        "region": {
            "type": "string",
            "description": "Region code such as 'us-en' or 'ru-ru'",
            "default": DEFAULT_REGION
        }
    });
    if with_time_limit {
        properties["time_limit"] = json!({
            "type": "string",
            "description": "Only results from the last day, week, month or year",
            "enum": TIME_LIMITS
        });
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["query"]
    })
}

pub fn tools(client: Arc<SearchClient>) -> Vec<Tool> {
    let handler = |kind| SearchHandler {
        client: client.clone(),
        kind,
    };

    vec![
        Tool::new(
            "search_web",
            "Web search through DuckDuckGo",
            schema(SearchKind::Web, true),
            handler(SearchKind::Web),
        ),
        Tool::new(
            "search_news",
            "News search through DuckDuckGo; defaults to the past week",
            schema(SearchKind::News, true),
            handler(SearchKind::News),
        ),
        Tool::new(
            "search_images",
            "Image search through DuckDuckGo",
            schema(SearchKind::Image, false),
            handler(SearchKind::Image),
        ),
        Tool::new(
            "search_videos",
            "Video search through DuckDuckGo",
            schema(SearchKind::Video, true),
            handler(SearchKind::Video),
        ),
    ]
}
