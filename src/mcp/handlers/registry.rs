//! Cloud.ru Artifact Registry tools.
//!
//! These return the API's JSON unchanged; every other server renders text.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::mcp::tools::{parse_args, Tool, ToolHandler};
use crate::models::RegistryType;
use crate::sources::ArtifactRegistryClient;
use crate::utils::require_non_empty;

#[derive(Debug, Deserialize)]
struct RegistryIdParams {
    #[serde(default)]
    registry_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    #[serde(default)]
    name: String,
    #[serde(default = "default_registry_type")]
    registry_type: String,
    #[serde(default)]
    is_public: bool,
}

fn default_registry_type() -> String {
    RegistryType::Docker.as_str().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryOp {
    List,
    Get,
    Create,
    Delete,
    Operations,
}

#[derive(Debug)]
struct RegistryHandler {
    client: Arc<ArtifactRegistryClient>,
    op: RegistryOp,
}

impl RegistryHandler {
    fn registry_id(args: Value) -> Result<String, GatewayError> {
        let params: RegistryIdParams = parse_args(args)?;
        Ok(require_non_empty("registry_id", &params.registry_id)?)
    }
}

#[async_trait]
impl ToolHandler for RegistryHandler {
    async fn execute(&self, args: Value) -> Result<Value, GatewayError> {
        match self.op {
            RegistryOp::List => self.client.list_registries().await,
            RegistryOp::Get => {
                let id = Self::registry_id(args)?;
                self.client.get_registry(&id).await
            }
            RegistryOp::Create => {
                let params: CreateParams = parse_args(args)?;
                let name = require_non_empty("name", &params.name)?;
                let registry_type: RegistryType = params.registry_type.parse()?;
                self.client
                    .create_registry(&name, registry_type, params.is_public)
                    .await
            }
            RegistryOp::Delete => {
                let id = Self::registry_id(args)?;
                self.client.delete_registry(&id).await
            }
            RegistryOp::Operations => {
                let id = Self::registry_id(args)?;
                self.client.registry_operations(&id).await
            }
        }
    }
}

fn registry_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "registry_id": {
                "type": "string",
                "description": "Registry identifier"
            }
        },
        "required": ["registry_id"]
    })
}

pub fn tools(client: Arc<ArtifactRegistryClient>) -> Vec<Tool> {
    let handler = |op| RegistryHandler {
        client: client.clone(),
        op,
    };

    vec![
        Tool::new(
            "list_registries",
            "List the project's artifact registries",
            json!({ "type": "object", "properties": {} }),
            handler(RegistryOp::List),
        ),
        Tool::new(
            "get_registry",
            "Details of one artifact registry",
            registry_id_schema(),
            handler(RegistryOp::Get),
        ),
        Tool::new(
            "create_registry",
            "Create an artifact registry",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Registry name"
                    },
                    "registry_type": {
                        "type": "string",
                        "description": "Package format",
                        "enum": RegistryType::NAMES,
                        "default": "DOCKER"
                    },
                    "is_public": {
                        "type": "boolean",
                        "description": "Allow anonymous pulls",
                        "default": false
                    }
                },
                "required": ["name"]
            }),
            handler(RegistryOp::Create),
        ),
        Tool::new(
            "delete_registry",
            "Delete an artifact registry",
            registry_id_schema(),
            handler(RegistryOp::Delete),
        ),
        Tool::new(
            "get_registry_operations",
            "Retention operations recorded for a registry",
            registry_id_schema(),
            handler(RegistryOp::Operations),
        ),
    ]
}
