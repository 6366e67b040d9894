//! UFC fighter, event and news tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::render;
use crate::sources::UfcClient;
use crate::utils::{require_min_chars, require_non_empty};

const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
struct FighterParams {
    #[serde(default)]
    fighter_name: String,
}

#[derive(Debug, Deserialize)]
struct ResultsParams {
    #[serde(default)]
    event_name: String,
    #[serde(default)]
    fighter_name: String,
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    #[serde(default)]
    fighter1: String,
    #[serde(default)]
    fighter2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UfcOp {
    Fighter,
    Upcoming,
    Rankings,
    Results,
    TitleFights,
    Stats,
}

#[derive(Debug)]
struct UfcHandler {
    client: Arc<UfcClient>,
    op: UfcOp,
}

impl UfcHandler {
    async fn fighter_card(&self, name: &str) -> Result<String, GatewayError> {
        Ok(match self.client.search_fighter(name).await? {
            Some(fighter) => render::ufc::fighter(&fighter),
            None => render::ufc::fighter_not_found(name),
        })
    }

    async fn results(&self, params: ResultsParams) -> Result<String, GatewayError> {
        let event_name = params.event_name.trim();
        let fighter_name = params.fighter_name.trim();

        if !event_name.is_empty() {
            return Ok(match self.client.find_event(event_name).await? {
                Some(event) => render::ufc::event(&event),
                None => render::ufc::event_not_found(event_name),
            });
        }
        if fighter_name.is_empty() {
            return Err(GatewayError::validation(
                "either event_name or fighter_name is required",
            ));
        }
        let name = require_min_chars("fighter_name", fighter_name, MIN_NAME_CHARS)?;
        self.fighter_card(&name).await
    }

    async fn stats(&self, params: StatsParams) -> Result<String, GatewayError> {
        let first = require_non_empty("fighter1", &params.fighter1)?;
        let second = params.fighter2.trim();
        if second.is_empty() {
            return self.fighter_card(&first).await;
        }

        let (a, b) = tokio::try_join!(
            self.client.search_fighter(&first),
            self.client.search_fighter(second),
        )?;
        Ok(render::ufc::comparison(
            (first.as_str(), a.as_ref()),
            (second, b.as_ref()),
        ))
    }
}

#[async_trait]
impl ToolHandler for UfcHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let text = match self.op {
            UfcOp::Fighter => {
                let params: FighterParams = parse_args(args)?;
                let name = require_min_chars("fighter_name", &params.fighter_name, MIN_NAME_CHARS)?;
                self.fighter_card(&name).await?
            }
            UfcOp::Upcoming => render::ufc::events(&self.client.upcoming_events().await?),
            UfcOp::Rankings => render::ufc::ranking_news(&self.client.ranking_news().await?),
            UfcOp::Results => self.results(parse_args(args)?).await?,
            UfcOp::TitleFights => render::ufc::title_fights(&self.client.title_fights().await?),
            UfcOp::Stats => self.stats(parse_args(args)?).await?,
        };
        Ok(Value::String(text))
    }
}

fn no_params() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub fn tools(client: Arc<UfcClient>) -> Vec<Tool> {
    let handler = |op| UfcHandler {
        client: client.clone(),
        op,
    };

    vec![
        Tool::new(
            "search_fighter",
            "Record, physical stats and stance of a UFC fighter",
            json!({
                "type": "object",
                "properties": {
                    "fighter_name": {
                        "type": "string",
                        "description": "Fighter name, e.g. 'Jon Jones'"
                    }
                },
                "required": ["fighter_name"]
            }),
            handler(UfcOp::Fighter),
        ),
        Tool::new(
            "get_upcoming_fights",
            "Scheduled UFC events with date, venue and main event",
            no_params(),
            handler(UfcOp::Upcoming),
        ),
        Tool::new(
            "get_ufc_rankings",
            "Latest news about UFC rankings and champions",
            no_params(),
            handler(UfcOp::Rankings),
        ),
        Tool::new(
            "search_fight_results",
            "Find an event by name, or a fighter's record",
            json!({
                "type": "object",
                "properties": {
                    "event_name": {
                        "type": "string",
                        "description": "Event name, e.g. 'UFC 300'",
                        "default": ""
                    },
                    "fighter_name": {
                        "type": "string",
                        "description": "Fighter name, used when no event is given",
                        "default": ""
                    }
                }
            }),
            handler(UfcOp::Results),
        ),
        Tool::new(
            "get_title_fights",
            "Championship news and upcoming title cards",
            no_params(),
            handler(UfcOp::TitleFights),
        ),
        Tool::new(
            "get_fight_stats",
            "Stats of one fighter, or a comparison of two",
            json!({
                "type": "object",
                "properties": {
                    "fighter1": {
                        "type": "string",
                        "description": "First fighter"
                    },
                    "fighter2": {
                        "type": "string",
                        "description": "Second fighter to compare against",
                        "default": ""
                    }
                },
                "required": ["fighter1"]
            }),
            handler(UfcOp::Stats),
        ),
    ]
}
