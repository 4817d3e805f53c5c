//! Configuration handling for the SQL diagnostics MCP server.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables. Servers are declared as `name=<connection string>`
//! pairs; the name is the key tools use, the ADO.NET-style connection string
//! is passed to the driver untouched (and never logged).

use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 10;
pub const DEFAULT_MAX_QUERIES_PER_MINUTE: usize = 60;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with streaming responses (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// One `name=<connection string>` server declaration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    /// Full connection string (sensitive - not logged).
    pub connection_string: String,
}

impl ServerConfig {
    /// Parse a server declaration from a CLI argument.
    ///
    /// # Format
    ///
    /// `name=Server=tcp:host,1433;Database=master;User Id=...;Password=...;`
    ///
    /// The split happens at the first `=`; everything after it is the
    /// connection string, which may itself contain `=` and `;`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let Some((name, connection_string)) = s.split_once('=') else {
            return Err(format!(
                "Invalid server declaration '{}'. Expected name=<connection string>.",
                s
            ));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err("Server name must not be empty.".to_string());
        }
        if connection_string.trim().is_empty() {
            return Err(format!("Server '{}' has an empty connection string.", name));
        }

        Ok(Self {
            name: name.to_string(),
            connection_string: connection_string.trim().to_string(),
        })
    }
}

/// Configuration for the SQL diagnostics MCP server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sqldiag-mcp-server",
    about = "MCP server for SQL Server diagnostics - exposes First Responder Kit, DarlingData and sp_WhoIsActive to AI assistants",
    version,
    author
)]
pub struct Config {
    /// Configured SQL Server instances.
    /// Format: "name=<ADO connection string>".
    /// Can be specified multiple times for multiple servers.
    #[arg(short = 's', long = "server", value_name = "NAME=CONNSTR", env = "MSSQL_SERVER")]
    pub servers: Vec<String>,

    /// Transport mode (stdio or http)
    #[arg(short, long, value_enum, default_value = "stdio", env = "MCP_TRANSPORT")]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Default row cap per result set
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS, env = "MSSQL_MAX_ROWS")]
    pub max_rows: usize,

    /// Statement timeout in seconds
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS, env = "MSSQL_COMMAND_TIMEOUT")]
    pub command_timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "MSSQL_CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Maximum number of requests allowed to run database work at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_QUERIES, env = "MSSQL_MAX_CONCURRENT_QUERIES")]
    pub max_concurrent_queries: usize,

    /// Maximum database requests admitted per minute (excess callers wait)
    #[arg(long, default_value_t = DEFAULT_MAX_QUERIES_PER_MINUTE, env = "MSSQL_MAX_QUERIES_PER_MINUTE")]
    pub max_queries_per_minute: usize,

    /// Expose the First Responder Kit tools (sp_Blitz family)
    #[arg(long, env = "MSSQL_ENABLE_FIRST_RESPONDER_KIT")]
    pub enable_first_responder_kit: bool,

    /// Expose the DarlingData tools (sp_PressureDetector, sp_QuickieStore...)
    #[arg(long, env = "MSSQL_ENABLE_DARLING_DATA")]
    pub enable_darling_data: bool,

    /// Expose the sp_WhoIsActive tool
    #[arg(long, env = "MSSQL_ENABLE_WHO_IS_ACTIVE")]
    pub enable_who_is_active: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            servers: Vec::new(),
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            max_rows: DEFAULT_MAX_ROWS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            max_queries_per_minute: DEFAULT_MAX_QUERIES_PER_MINUTE,
            enable_first_responder_kit: false,
            enable_darling_data: false,
            enable_who_is_active: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Parse all server declarations.
    pub fn parse_servers(&self) -> Result<Vec<ServerConfig>, String> {
        self.servers.iter().map(|s| ServerConfig::parse(s)).collect()
    }

    /// Validate the full configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.servers.is_empty() {
            errors.push("At least one server must be configured (--server name=<connection string>).".to_string());
        }

        match self.parse_servers() {
            Ok(servers) => {
                let mut seen = std::collections::HashSet::new();
                for server in &servers {
                    if !seen.insert(server.name.clone()) {
                        errors.push(format!("Server '{}' is declared more than once.", server.name));
                    }
                    if let Err(e) = tiberius::Config::from_ado_string(&server.connection_string) {
                        errors.push(format!(
                            "Server '{}' has an invalid connection string: {}",
                            server.name, e
                        ));
                    }
                }
            }
            Err(e) => errors.push(e),
        }

        if self.max_rows < 1 || self.max_rows > 100_000 {
            errors.push(format!(
                "max_rows must be between 1 and 100,000 (got {}).",
                self.max_rows
            ));
        }

        if self.command_timeout < 1 || self.command_timeout > 600 {
            errors.push(format!(
                "command_timeout must be between 1 and 600 seconds (got {}).",
                self.command_timeout
            ));
        }

        if self.max_concurrent_queries < 1 || self.max_concurrent_queries > 100 {
            errors.push(format!(
                "max_concurrent_queries must be between 1 and 100 (got {}).",
                self.max_concurrent_queries
            ));
        }

        if self.max_queries_per_minute < 1 || self.max_queries_per_minute > 10_000 {
            errors.push(format!(
                "max_queries_per_minute must be between 1 and 10,000 (got {}).",
                self.max_queries_per_minute
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Security- and size-related warnings to log at startup.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_rows > 10_000 {
            warnings.push(format!(
                "max_rows is set to {}. Large values may produce very large JSON responses.",
                self.max_rows
            ));
        }

        if let Ok(servers) = self.parse_servers() {
            for server in servers {
                let lowered = server.connection_string.to_ascii_lowercase();
                let flattened: String = lowered.split_whitespace().collect();
                if flattened.contains("encrypt=false") || flattened.contains("encrypt=no") {
                    warnings.push(format!(
                        "Server '{}': connection string disables encryption. Traffic will not be encrypted.",
                        server.name
                    ));
                }
                if flattened.contains("trustservercertificate=true") {
                    warnings.push(format!(
                        "Server '{}': connection string trusts the server certificate. It will not be validated.",
                        server.name
                    ));
                }
            }
        }

        warnings
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the statement timeout as a Duration.
    pub fn command_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
