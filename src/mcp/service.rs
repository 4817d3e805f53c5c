//! MCP service implementation using rmcp.
//!
//! This module defines the DiagService struct with every diagnostic tool
//! exposed via the MCP protocol using the rmcp framework's macros. The tool
//! methods are thin: they hand their typed input to the matching toolkit
//! handler (or the gateway directly for ad-hoc queries) and return the shaped
//! JSON payload as-is.

use crate::gate::ExecutionGateway;
use crate::toolkits::darling_data::{
    DarlingDataToolkit, HealthParserInput, HumanEventsBlockViewerInput, IndexCleanupInput,
    LogHunterInput, PressureDetectorInput, QueryReproBuilderInput, QuickieStoreInput,
};
use crate::toolkits::first_responder::{
    BlitzCacheInput, BlitzFirstInput, BlitzIndexInput, BlitzInput, BlitzLockInput, BlitzWhoInput,
    FirstResponderToolkit,
};
use crate::toolkits::who_is_active::{WhoIsActiveInput, WhoIsActiveToolkit};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which toolkits the server was started with.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolsetFlags {
    pub first_responder_kit: bool,
    pub darling_data: bool,
    pub who_is_active: bool,
}

/// Input for the read_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadDataInput {
    /// Server name from list_servers
    pub server: String,
    /// Database to run the query in. Omit to use the connection's default.
    #[serde(default)]
    pub database: Option<String>,
    /// Read-only SELECT statement to execute
    pub query: String,
}

/// Input for the list_databases tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDatabasesInput {
    /// Server name from list_servers
    pub server: String,
}

/// Output for the list_servers tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListServersOutput {
    /// Configured server names, sorted
    pub servers: Vec<String>,
    /// Number of servers
    pub count: usize,
}

#[derive(Clone)]
pub struct DiagService {
    /// Shared execution gateway for all database operations
    gateway: Arc<ExecutionGateway>,
    first_responder: Option<Arc<FirstResponderToolkit>>,
    darling_data: Option<Arc<DarlingDataToolkit>>,
    who_is_active: Option<Arc<WhoIsActiveToolkit>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DiagService {
    /// Create a new DiagService instance.
    ///
    /// Tools of a toolkit that was not enabled stay registered but report an
    /// invalid-params error naming the flag that would enable them.
    pub fn new(gateway: Arc<ExecutionGateway>, toolsets: ToolsetFlags) -> Self {
        Self {
            first_responder: toolsets
                .first_responder_kit
                .then(|| Arc::new(FirstResponderToolkit::new(gateway.clone()))),
            darling_data: toolsets
                .darling_data
                .then(|| Arc::new(DarlingDataToolkit::new(gateway.clone()))),
            who_is_active: toolsets
                .who_is_active
                .then(|| Arc::new(WhoIsActiveToolkit::new(gateway.clone()))),
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    fn first_responder_toolkit(&self) -> Result<&FirstResponderToolkit, McpError> {
        self.first_responder.as_deref().ok_or_else(|| {
            McpError::invalid_params(
                "The First Responder Kit toolset is not enabled. Start the server with --enable-first-responder-kit.",
                None,
            )
        })
    }

    fn darling_data_toolkit(&self) -> Result<&DarlingDataToolkit, McpError> {
        self.darling_data.as_deref().ok_or_else(|| {
            McpError::invalid_params(
                "The DarlingData toolset is not enabled. Start the server with --enable-darling-data.",
                None,
            )
        })
    }

    fn who_is_active_toolkit(&self) -> Result<&WhoIsActiveToolkit, McpError> {
        self.who_is_active.as_deref().ok_or_else(|| {
            McpError::invalid_params(
                "The sp_WhoIsActive toolset is not enabled. Start the server with --enable-who-is-active.",
                None,
            )
        })
    }
}

#[tool_router]
impl DiagService {
    #[tool(
        description = "List the configured SQL Server instances.\nUse the returned names as the `server` argument of every other tool."
    )]
    async fn list_servers(&self) -> Json<ListServersOutput> {
        let servers = self.gateway.server_names();
        let count = servers.len();
        Json(ListServersOutput { servers, count })
    }

    #[tool(description = "List all databases on a server (reads sys.databases).")]
    async fn list_databases(
        &self,
        Parameters(input): Parameters<ListDatabasesInput>,
    ) -> Result<String, McpError> {
        self.gateway
            .execute_query(
                &input.server,
                None,
                "SELECT name FROM sys.databases ORDER BY name",
            )
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Execute a read-only SELECT query and return the result sets as JSON.\nWrite operations, DDL, transaction control and procedure calls are rejected.\nRow counts and string lengths are bounded by server configuration."
    )]
    async fn read_data(
        &self,
        Parameters(input): Parameters<ReadDataInput>,
    ) -> Result<String, McpError> {
        self.gateway
            .execute_query(&input.server, input.database.as_deref(), &input.query)
            .await
            .map_err(McpError::from)
    }

    // ── First Responder Kit ────────────────────────────────

    #[tool(
        description = "Run sp_Blitz: overall SQL Server health check.\nReturns prioritized findings about configuration, reliability and performance."
    )]
    async fn blitz(&self, Parameters(input): Parameters<BlitzInput>) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_BlitzFirst: point-in-time performance snapshot.\nSamples activity for a few seconds and reports what is hurting right now."
    )]
    async fn blitz_first(
        &self,
        Parameters(input): Parameters<BlitzFirstInput>,
    ) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz_first(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_BlitzCache: analyze the plan cache for the most expensive queries.\nSort by cpu, reads, duration, executions, memory grant or spills."
    )]
    async fn blitz_cache(
        &self,
        Parameters(input): Parameters<BlitzCacheInput>,
    ) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz_cache(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_BlitzIndex: diagnose index problems in a database.\nReports missing, unused, duplicate and heap/wide indexes."
    )]
    async fn blitz_index(
        &self,
        Parameters(input): Parameters<BlitzIndexInput>,
    ) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz_index(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_BlitzWho: list currently running sessions with their queries and waits."
    )]
    async fn blitz_who(
        &self,
        Parameters(input): Parameters<BlitzWhoInput>,
    ) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz_who(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_BlitzLock: analyze recent deadlocks from the system_health session.\nSet include_xml_reports to get the raw deadlock graphs."
    )]
    async fn blitz_lock(
        &self,
        Parameters(input): Parameters<BlitzLockInput>,
    ) -> Result<String, McpError> {
        self.first_responder_toolkit()?
            .blitz_lock(input)
            .await
            .map_err(McpError::from)
    }

    // ── DarlingData ────────────────────────────────────────

    #[tool(
        description = "Run sp_PressureDetector: check for CPU and memory pressure happening right now."
    )]
    async fn pressure_detector(
        &self,
        Parameters(input): Parameters<PressureDetectorInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .pressure_detector(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_QuickieStore: analyze Query Store data for the most expensive queries.\nSupports date ranges, text search and query/plan id filters."
    )]
    async fn quickie_store(
        &self,
        Parameters(input): Parameters<QuickieStoreInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .quickie_store(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_HealthParser: parse the system_health Extended Event session.\nReports waits, disk, memory, CPU and locking problems over a date range."
    )]
    async fn health_parser(
        &self,
        Parameters(input): Parameters<HealthParserInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .health_parser(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_LogHunter: search the SQL Server error log for interesting entries."
    )]
    async fn log_hunter(
        &self,
        Parameters(input): Parameters<LogHunterInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .log_hunter(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_HumanEventsBlockViewer: analyze a blocked process report Extended Event session."
    )]
    async fn human_events_block_viewer(
        &self,
        Parameters(input): Parameters<HumanEventsBlockViewerInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .human_events_block_viewer(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_IndexCleanup: find unused and duplicate indexes that are safe to drop.\nRead-only analysis; it never drops anything."
    )]
    async fn index_cleanup(
        &self,
        Parameters(input): Parameters<IndexCleanupInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .index_cleanup(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run sp_QueryReproBuilder: extract everything needed to reproduce a query from Query Store."
    )]
    async fn query_repro_builder(
        &self,
        Parameters(input): Parameters<QueryReproBuilderInput>,
    ) -> Result<String, McpError> {
        self.darling_data_toolkit()?
            .query_repro_builder(input)
            .await
            .map_err(McpError::from)
    }

    // ── WhoIsActive ────────────────────────────────────────

    #[tool(
        description = "Run sp_WhoIsActive: detailed snapshot of current session activity.\nUse compact=true for a reduced column set, get_plans/get_locks for plan and lock XML."
    )]
    async fn who_is_active(
        &self,
        Parameters(input): Parameters<WhoIsActiveInput>,
    ) -> Result<String, McpError> {
        self.who_is_active_toolkit()?
            .who_is_active(input)
            .await
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for DiagService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sqldiag-mcp-server".to_owned(),
                title: Some("SQL Server Diagnostics MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Diagnostic tools for SQL Server instances.\n\
                \n\
                ## Workflow\n\
                1. Call `list_servers` to get the configured server names\n\
                2. Pass a name from step 1 as `server` in every other tool call\n\
                3. Use `read_data` for ad-hoc SELECT queries, the sp_* tools for diagnostics\n\
                \n\
                ## Output shape\n\
                Diagnostic tools return a JSON array with one `{truncated, rows}` object\n\
                per result set. Long strings are cut with a `...[truncated]` marker and\n\
                noisy columns (plan XML, handles) are dropped by default:\n\
                - `include_query_plans: true` keeps execution plan columns\n\
                - `include_xml_reports: true` keeps deadlock/blocked-process XML\n\
                - `verbose: true` disables all trimming (large responses!)\n\
                \n\
                ## Toolkits\n\
                The sp_* procedures must be installed on the target server and their\n\
                toolset enabled at server start. Disabled toolsets report which flag\n\
                enables them."
                    .to_string(),
            ),
        }
    }
}
