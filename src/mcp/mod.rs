//! MCP (Model Context Protocol) implementation.

pub mod domain;
pub mod handlers;
pub mod server;
mod tools;

pub use domain::Domain;
pub use handlers::tools_for;
pub use server::McpServer;
pub use tools::{parse_args, Tool, ToolHandler, ToolRegistry};
