//! `ip_address_query` and `ip_address_query_detailed`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::render;
use crate::sources::IpClient;

#[derive(Debug, Deserialize)]
struct IpParams {
    #[serde(default)]
    ip: String,
}

#[derive(Debug)]
struct IpHandler {
    client: Arc<IpClient>,
    detailed: bool,
}

#[async_trait]
impl ToolHandler for IpHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        let params: IpParams = parse_args(args)?;
        let record = self.client.lookup(&params.ip).await?;
        let text = if self.detailed {
            render::ip::detailed(&record)
        } else {
            render::ip::summary(&record)
        };
        Ok(Value::String(text))
    }
}

fn ip_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ip": {
                "type": "string",
                "description": "IPv4/IPv6 address or host name; empty looks up this server's public address",
                "default": ""
            }
        }
    })
}

pub fn tools(client: Arc<IpClient>) -> Vec<Tool> {
    vec![
        Tool::new(
            "ip_address_query",
            "Country, city, provider and coordinates of an IP address",
            ip_schema(),
            IpHandler {
                client: client.clone(),
                detailed: false,
            },
        ),
        Tool::new(
            "ip_address_query_detailed",
            "Full geolocation and network details of an IP address, including connection type",
            ip_schema(),
            IpHandler {
                client,
                detailed: true,
            },
        ),
    ]
}
