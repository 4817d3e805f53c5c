//! SQL Server Diagnostics MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to run a fixed catalog of SQL Server diagnostic stored procedures (the
//! First Responder Kit, DarlingData and sp_WhoIsActive) and ad-hoc read
//! queries, with admission control and size-bounded JSON results.

pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod mcp;
pub mod toolkits;
pub mod transport;

pub use config::Config;
pub use error::DiagError;
pub use gate::ExecutionGateway;
pub use mcp::DiagService;
