//! MCP protocol layer.
//!
//! Exposes the execution gateway and toolkits as MCP tools via rmcp.

pub mod service;

pub use service::{DiagService, ToolsetFlags};
