//! First Responder Kit toolkit (sp_Blitz family).
//!
//! Thin parameter mapping over the execution gateway plus the per-routine
//! format-option factories. The factories are deterministic lookup tables:
//! `verbose` always short-circuits to unbounded output, and each `include_*`
//! flag removes a fixed set of columns from the routine's default exclusions.

use crate::db::params::{RoutineParams, add_flag_param, add_param};
use crate::error::DiagResult;
use crate::gate::format::{FormatOptions, column_limits, column_set};
use crate::gate::{ExecutionGateway, ToolkitCatalog};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Build the First Responder Kit safety catalog.
pub fn catalog() -> ToolkitCatalog {
    ToolkitCatalog::new(
        "first-responder-kit",
        &[
            "sp_Blitz",
            "sp_BlitzFirst",
            "sp_BlitzCache",
            "sp_BlitzIndex",
            "sp_BlitzWho",
            "sp_BlitzLock",
        ],
        &[
            "@OutputDatabaseName",
            "@OutputSchemaName",
            "@OutputTableName",
            "@OutputServerName",
            "@OutputTableNameFileStats",
            "@OutputTableNamePerfmonStats",
            "@OutputTableNameWaitStats",
            "@OutputTableRetentionDays",
        ],
        "output table parameters are blocked",
        "The First Responder Kit must be installed. \
         See: https://github.com/BrentOzarULTD/SQL-Server-First-Responder-Kit",
    )
}

/// Input for the blitz tool (sp_Blitz overall health check).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzInput {
    /// Server name from list_servers
    pub server: String,
    /// Check user database objects (slower on large instances)
    #[serde(default)]
    pub check_user_database_objects: Option<bool>,
    /// Include server configuration details
    #[serde(default)]
    pub check_server_info: Option<bool>,
    /// Hide findings below this priority
    #[serde(default)]
    pub ignore_priorities_above: Option<i32>,
    /// Run the more invasive checks
    #[serde(default)]
    pub bring_the_pain: Option<bool>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the blitz_first tool (sp_BlitzFirst performance snapshot).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzFirstInput {
    /// Server name from list_servers
    pub server: String,
    /// Sample duration in seconds
    #[serde(default)]
    pub seconds: Option<i32>,
    /// Return expert-mode result sets
    #[serde(default)]
    pub expert_mode: Option<bool>,
    /// Include sleeping sessions
    #[serde(default)]
    pub show_sleeping_spids: Option<bool>,
    /// Report totals since instance startup
    #[serde(default)]
    pub since_startup: Option<bool>,
    /// Minimum file latency to report, in milliseconds
    #[serde(default)]
    pub file_latency_threshold_ms: Option<i32>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Which result sets sp_BlitzFirst should emit (@OutputResultSets)
    #[serde(default)]
    pub result_sets: Option<String>,
}

/// Input for the blitz_cache tool (sp_BlitzCache plan cache analysis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzCacheInput {
    /// Server name from list_servers
    pub server: String,
    /// Sort order: cpu, reads, duration, executions, memory grant, spills...
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Number of queries to return. Default: 10
    #[serde(default)]
    pub top: Option<i32>,
    /// Return expert-mode columns
    #[serde(default)]
    pub expert_mode: Option<bool>,
    /// Restrict analysis to one database
    #[serde(default)]
    pub database_name: Option<String>,
    /// Search plan XML for this string (slow)
    #[serde(default)]
    pub slowly_search_plans_for: Option<String>,
    /// Produce spreadsheet-friendly output
    #[serde(default)]
    pub export_to_excel: Option<bool>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the blitz_index tool (sp_BlitzIndex index diagnosis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzIndexInput {
    /// Server name from list_servers
    pub server: String,
    /// Database to analyze
    #[serde(default)]
    pub database_name: Option<String>,
    /// Schema of the table to analyze
    #[serde(default)]
    pub schema_name: Option<String>,
    /// Single table to analyze
    #[serde(default)]
    pub table_name: Option<String>,
    /// Analyze every database
    #[serde(default)]
    pub get_all_databases: Option<bool>,
    /// Analysis mode: 0=diagnose, 1=summarize, 2=usage detail, 4=detailed diagnosis
    #[serde(default)]
    pub mode: Option<i32>,
    /// Minimum index size to report
    #[serde(default)]
    pub threshold_mb: Option<i32>,
    /// Filter: 0=all, 1=no low-usage warnings, 2=only warnings
    #[serde(default)]
    pub filter: Option<i32>,
    /// Include sample execution plan columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the blitz_who tool (sp_BlitzWho active session listing).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzWhoInput {
    /// Server name from list_servers
    pub server: String,
    /// Return expert-mode columns
    #[serde(default)]
    pub expert_mode: Option<bool>,
    /// Include sleeping sessions
    #[serde(default)]
    pub show_sleeping_spids: Option<bool>,
    /// Only sessions running at least this long
    #[serde(default)]
    pub min_elapsed_seconds: Option<i32>,
    /// Only sessions with at least this much CPU time (ms)
    #[serde(default)]
    pub min_cpu_time: Option<i32>,
    /// Only sessions with at least this many logical reads
    #[serde(default)]
    pub min_logical_reads: Option<i32>,
    /// Only sessions blocked at least this long
    #[serde(default)]
    pub min_blocking_seconds: Option<i32>,
    /// Only sessions using at least this much tempdb (MB)
    #[serde(default)]
    pub min_tempdb_mb: Option<i32>,
    /// Include actual parameter values
    #[serde(default)]
    pub show_actual_parameters: Option<bool>,
    /// Capture live query plans (needs extra permissions)
    #[serde(default)]
    pub get_live_query_plan: Option<bool>,
    /// Sort order for the session list
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the blitz_lock tool (sp_BlitzLock deadlock analysis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BlitzLockInput {
    /// Server name from list_servers
    pub server: String,
    /// Database to analyze
    #[serde(default)]
    pub database_name: Option<String>,
    /// Analyze deadlocks after this date (ISO-8601). Default: days_back ago
    #[serde(default)]
    pub start_date: Option<String>,
    /// Analyze deadlocks before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Filter to deadlocks involving this object
    #[serde(default)]
    pub object_name: Option<String>,
    /// Filter to deadlocks involving this stored procedure
    #[serde(default)]
    pub stored_proc_name: Option<String>,
    /// Filter by application name
    #[serde(default)]
    pub app_name: Option<String>,
    /// Filter by host name
    #[serde(default)]
    pub host_name: Option<String>,
    /// Filter by login name
    #[serde(default)]
    pub login_name: Option<String>,
    /// Only show deadlock victims
    #[serde(default)]
    pub victims_only: Option<bool>,
    /// Extended Event session to read (default system_health)
    #[serde(default)]
    pub event_session_name: Option<String>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Include deadlock graph / process XML columns in the output
    #[serde(default)]
    pub include_xml_reports: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// How many days back to analyze when start_date is absent. Default: 1
    #[serde(default)]
    pub days_back: Option<i32>,
}

/// First Responder Kit handler: maps tool inputs to routine invocations.
#[derive(Debug)]
pub struct FirstResponderToolkit {
    gateway: Arc<ExecutionGateway>,
    catalog: ToolkitCatalog,
}

impl FirstResponderToolkit {
    pub fn new(gateway: Arc<ExecutionGateway>) -> Self {
        Self {
            gateway,
            catalog: catalog(),
        }
    }

    pub async fn blitz(&self, input: BlitzInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_flag_param(
            &mut parameters,
            "@CheckUserDatabaseObjects",
            input.check_user_database_objects,
        );
        add_flag_param(&mut parameters, "@CheckServerInfo", input.check_server_info);
        add_param(
            &mut parameters,
            "@IgnorePrioritiesAbove",
            input.ignore_priorities_above,
        );
        add_flag_param(&mut parameters, "@BringThePain", input.bring_the_pain);

        let options = build_blitz_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_Blitz",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn blitz_first(&self, input: BlitzFirstInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@Seconds", input.seconds);
        add_flag_param(&mut parameters, "@ExpertMode", input.expert_mode);
        add_flag_param(
            &mut parameters,
            "@ShowSleepingSPIDs",
            input.show_sleeping_spids,
        );
        add_flag_param(&mut parameters, "@SinceStartup", input.since_startup);
        add_param(
            &mut parameters,
            "@FileLatencyThresholdMS",
            input.file_latency_threshold_ms,
        );
        add_param(&mut parameters, "@OutputResultSets", input.result_sets);

        let options = build_blitz_first_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_BlitzFirst",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn blitz_cache(&self, input: BlitzCacheInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@SortOrder", input.sort_order);
        add_param(&mut parameters, "@Top", Some(input.top.unwrap_or(10)));
        add_flag_param(&mut parameters, "@ExpertMode", input.expert_mode);
        add_param(&mut parameters, "@DatabaseName", input.database_name);
        add_param(
            &mut parameters,
            "@SlowlySearchPlansFor",
            input.slowly_search_plans_for,
        );
        // Spreadsheet output keeps the XML columns small by default.
        add_flag_param(
            &mut parameters,
            "@ExportToExcel",
            Some(input.export_to_excel.unwrap_or(true)),
        );

        let options = build_blitz_cache_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_BlitzCache",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn blitz_index(&self, input: BlitzIndexInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@DatabaseName", input.database_name);
        add_param(&mut parameters, "@SchemaName", input.schema_name);
        add_param(&mut parameters, "@TableName", input.table_name);
        add_flag_param(&mut parameters, "@GetAllDatabases", input.get_all_databases);
        add_param(&mut parameters, "@Mode", input.mode);
        add_param(&mut parameters, "@ThresholdMB", input.threshold_mb);
        add_param(&mut parameters, "@Filter", input.filter);

        let options = build_blitz_index_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_BlitzIndex",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn blitz_who(&self, input: BlitzWhoInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_flag_param(&mut parameters, "@ExpertMode", input.expert_mode);
        add_flag_param(
            &mut parameters,
            "@ShowSleepingSPIDs",
            input.show_sleeping_spids,
        );
        add_param(
            &mut parameters,
            "@MinElapsedSeconds",
            input.min_elapsed_seconds,
        );
        add_param(&mut parameters, "@MinCPUTime", input.min_cpu_time);
        add_param(&mut parameters, "@MinLogicalReads", input.min_logical_reads);
        add_param(
            &mut parameters,
            "@MinBlockingSeconds",
            input.min_blocking_seconds,
        );
        add_param(&mut parameters, "@MinTempdbMB", input.min_tempdb_mb);
        add_flag_param(
            &mut parameters,
            "@ShowActualParameters",
            input.show_actual_parameters,
        );
        add_flag_param(
            &mut parameters,
            "@GetLiveQueryPlan",
            input.get_live_query_plan,
        );
        add_param(&mut parameters, "@SortOrder", input.sort_order);

        let options = build_blitz_who_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_BlitzWho",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn blitz_lock(&self, input: BlitzLockInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@DatabaseName", input.database_name);
        match input.start_date {
            Some(start_date) => add_param(&mut parameters, "@StartDate", Some(start_date)),
            None => {
                let days_back = i64::from(input.days_back.unwrap_or(1));
                let start = chrono::Utc::now().naive_utc() - chrono::Duration::days(days_back);
                add_param(&mut parameters, "@StartDate", Some(start));
            }
        }
        add_param(&mut parameters, "@EndDate", input.end_date);
        add_param(&mut parameters, "@ObjectName", input.object_name);
        add_param(&mut parameters, "@StoredProcName", input.stored_proc_name);
        add_param(&mut parameters, "@AppName", input.app_name);
        add_param(&mut parameters, "@HostName", input.host_name);
        add_param(&mut parameters, "@LoginName", input.login_name);
        add_flag_param(&mut parameters, "@VictimsOnly", input.victims_only);
        add_param(
            &mut parameters,
            "@EventSessionName",
            input.event_session_name,
        );

        let options = build_blitz_lock_options(
            input.include_query_plans,
            input.include_xml_reports,
            input.verbose,
        );
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_BlitzLock",
                parameters,
                Some(options),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Format option factories
// ---------------------------------------------------------------------------

pub fn build_blitz_options(include_query_plans: Option<bool>, verbose: Option<bool>) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&["QueryPlan", "QueryPlanFiltered"]);
    if include_query_plans == Some(true) {
        excluded.remove("queryplan");
        excluded.remove("queryplanfiltered");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("Details", 2000)]),
        ..Default::default()
    }
}

pub fn build_blitz_first_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "QueryPlan",
        "PlanHandle",
        "QueryStatsNowID",
        "QueryStatsFirstID",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("queryplan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("QueryText", 500), ("HowToStopIt", 1000)]),
        ..Default::default()
    }
}

pub fn build_blitz_cache_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "QueryPlan",
        "Query Plan",
        "implicit_conversion_info",
        "Implicit Conversion Info",
        "cached_execution_parameters",
        "Cached Execution Parameters",
        "missing_indexes",
        "Missing Indexes",
        "PlanHandle",
        "Plan Handle",
        "SqlHandle",
        "SQL Handle",
        "QueryHash",
        "QueryPlanHash",
        "Remove Plan Handle From Cache",
        "SetOptions",
        "SET Options",
        "StatementStartOffset",
        "StatementEndOffset",
        "PlanGenerationNum",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("queryplan");
        excluded.remove("query plan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[
            ("QueryText", 500),
            ("Query Text", 500),
            ("Warnings", 2000),
        ]),
        ..Default::default()
    }
}

pub fn build_blitz_index_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "sample_query_plan",
        "more_info",
        "blitz_result_id",
        "check_id",
        "index_sanity_id",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("sample_query_plan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[
            ("create_tsql", 1000),
            ("details", 2000),
            ("index_definition", 500),
            ("secret_columns", 500),
        ]),
        ..Default::default()
    }
}

pub fn build_blitz_who_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "query_plan",
        "live_query_plan",
        "cached_parameter_info",
        "Live_Parameter_Info",
        "fix_parameter_sniffing",
        "context_info",
        "sql_handle",
        "plan_handle",
        "statement_start_offset",
        "statement_end_offset",
        "query_hash",
        "query_plan_hash",
        "outer_command",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
        excluded.remove("live_query_plan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("query_text", 500), ("top_session_waits", 500)]),
        ..Default::default()
    }
}

pub fn build_blitz_lock_options(
    include_query_plans: Option<bool>,
    include_xml_reports: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "deadlock_graph",
        "process_xml",
        "parallel_deadlock_details",
        "query_plan",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
    }
    if include_xml_reports == Some(true) {
        excluded.remove("deadlock_graph");
        excluded.remove("process_xml");
        excluded.remove("parallel_deadlock_details");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[
            ("query", 500),
            ("query_xml", 500),
            ("object_names", 500),
            ("finding", 2000),
        ]),
        ..Default::default()
    }
}
