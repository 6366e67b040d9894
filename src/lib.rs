//! # MCP Gateways
//!
//! Model Context Protocol (MCP) tool servers over public web APIs: weather,
//! page fetching, IP geolocation, a cloud artifact registry, UFC data,
//! Yandex and DuckDuckGo search, and Wikipedia.
//!
//! ## Architecture
//!
//! - [`gateway`]: source fallback, bearer tokens and the error taxonomy
//! - [`sources`]: one client per external API
//! - [`normalize`]: HTML, wikitext and XML reduction to plain text
//! - [`models`]: normalized records returned by the clients
//! - [`render`]: plain-text presentation of those records
//! - [`mcp`]: tool handlers and the MCP server
//! - [`config`]: layered configuration and credentials
//! - [`utils`]: HTTP client and argument validation

pub mod config;
pub mod gateway;
pub mod mcp;
pub mod models;
pub mod normalize;
pub mod render;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use gateway::{GatewayError, SourceError};
pub use mcp::{Domain, McpServer, ToolRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
