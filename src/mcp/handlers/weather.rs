//! `get_today_weather` and `get_weekly_forecast`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::render;
use crate::sources::WeatherClient;
use crate::utils::require_non_empty;

#[derive(Debug, Deserialize)]
struct CityParams {
    #[serde(default)]
    city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Today,
    Week,
}

impl Span {
    fn days(self) -> u8 {
        match self {
            Span::Today => 1,
            Span::Week => 7,
        }
    }
}

#[derive(Debug)]
struct WeatherHandler {
    client: Arc<WeatherClient>,
    span: Span,
}

#[async_trait]
impl ToolHandler for WeatherHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let params: CityParams = parse_args(args)?;
        let city = require_non_empty("city", &params.city)?;

        let report = self.client.report(&city, self.span.days()).await?;
        let text = match self.span {
            Span::Today => render::weather::today(&report),
            Span::Week => render::weather::weekly(&report),
        };
        Ok(Value::String(text))
    }
}

fn city_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "city": {
                "type": "string",
                "description": "City name, e.g. 'Moscow' or 'New York'"
            }
        },
        "required": ["city"]
    })
}

pub fn tools(client: Arc<WeatherClient>) -> Vec<Tool> {
    vec![
        Tool::new(
            "get_today_weather",
            "Current weather conditions for a city",
            city_schema(),
            WeatherHandler {
                client: client.clone(),
                span: Span::Today,
            },
        ),
        Tool::new(
            "get_weekly_forecast",
            "Seven-day daily forecast for a city",
            city_schema(),
            WeatherHandler {
                client,
                span: Span::Week,
            },
        ),
    ]
}
