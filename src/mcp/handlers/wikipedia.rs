//! Wikipedia search and article tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::models::WIKI_LANGUAGES;
use crate::render;
use crate::sources::WikipediaClient;
use crate::utils::{require_non_empty, require_one_of, require_range};

#[derive(Debug, Deserialize)]
struct WikiSearchParams {
    #[serde(default)]
    query: String,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Debug, Deserialize)]
struct WikiPageParams {
    #[serde(default)]
    title: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_limit() -> i64 {
    10
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageView {
    Summary,
    Content,
    Sections,
    Links,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WikiOp {
    Search,
    Page(PageView),
}

#[derive(Debug)]
struct WikipediaHandler {
    client: Arc<WikipediaClient>,
    op: WikiOp,
}

impl WikipediaHandler {
    async fn page(&self, view: PageView, params: WikiPageParams) -> Result<String, GatewayError> {
        let title = require_non_empty("title", &params.title)?;
        let language = require_one_of("language", &params.language, WIKI_LANGUAGES)?;
        let missing = || render::wiki::not_found(&title, language);

        Ok(match view {
            PageView::Summary => self
                .client
                .summary(&title, language)
                .await?
                .map_or_else(missing, |s| render::wiki::summary(&s)),
            PageView::Content => self
                .client
                .content(&title, language)
                .await?
                .map_or_else(missing, |a| render::wiki::article(&a)),
            PageView::Sections => self
                .client
                .sections(&title, language)
                .await?
                .map_or_else(missing, |s| render::wiki::sections(&s)),
            PageView::Links => self
                .client
                .links(&title, language)
                .await?
                .map_or_else(missing, |l| render::wiki::links(&l)),
        })
    }
}

#[async_trait]
impl ToolHandler for WikipediaHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let text = match self.op {
            WikiOp::Search => {
                let params: WikiSearchParams = parse_args(args)?;
                let query = require_non_empty("query", &params.query)?;
                let limit = require_range("limit", params.limit, 1, 50)? as u32;
                let language = require_one_of("language", &params.language, WIKI_LANGUAGES)?;

                let hits = self.client.search(&query, limit, language).await?;
                render::wiki::search_hits(&query, language, &hits)
            }
            WikiOp::Page(view) => self.page(view, parse_args(args)?).await?,
        };
        Ok(Value::String(text))
    }
}

fn language_schema() -> Value {
    json!({
        "type": "string",
        "description": "Wikipedia language edition",
        "enum": WIKI_LANGUAGES,
        "default": "en"
    })
}

fn page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Exact article title"
            },
            "language": language_schema()
        },
        "required": ["title"]
    })
}

pub fn tools(client: Arc<WikipediaClient>) -> Vec<Tool> {
    let handler = |op| WikipediaHandler {
        client: client.clone(),
        op,
    };

    vec![
        Tool::new(
            "search_wikipedia",
            "Search Wikipedia articles",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of results (1-50)",
                        "default": 10,
                        "minimum": 1,
                        "maximum": 50
                    },
                    "language": language_schema()
                },
                "required": ["query"]
            }),
            handler(WikiOp::Search),
        ),
        Tool::new(
            "get_wikipedia_summary",
            "Short summary of an article",
            page_schema(),
            handler(WikiOp::Page(PageView::Summary)),
        ),
        Tool::new(
            "get_wikipedia_content",
            "Full plain text of an article",
            page_schema(),
            handler(WikiOp::Page(PageView::Content)),
        ),
        Tool::new(
            "get_wikipedia_sections",
            "Table of contents of an article",
            page_schema(),
            handler(WikiOp::Page(PageView::Sections)),
        ),
        Tool::new(
            "get_wikipedia_links",
            "Articles linked from an article",
            page_schema(),
            handler(WikiOp::Page(PageView::Links)),
        ),
    ]
}
