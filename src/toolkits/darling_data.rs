//! DarlingData toolkit (sp_PressureDetector, sp_QuickieStore and friends).
//!
//! Same shape as the First Responder toolkit: static catalog, parameter
//! mapping, per-routine format-option factories. One deliberate difference:
//! the factories here keep honoring a caller `max_rows` even under
//! `verbose = true`, because verbose governs string truncation and these
//! routines can return very large histories.

use crate::db::params::{RoutineParams, add_flag_param, add_param};
use crate::error::DiagResult;
use crate::gate::format::{FormatOptions, column_limits, column_set};
use crate::gate::{ExecutionGateway, ToolkitCatalog};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Row override applied to sp_LogHunter when the caller gives none.
const LOG_HUNTER_DEFAULT_MAX_ROWS: usize = 200;

/// Build the DarlingData safety catalog.
pub fn catalog() -> ToolkitCatalog {
    ToolkitCatalog::new(
        "darling-data",
        &[
            "sp_PressureDetector",
            "sp_QuickieStore",
            "sp_HealthParser",
            "sp_LogHunter",
            "sp_HumanEventsBlockViewer",
            "sp_IndexCleanup",
            "sp_QueryReproBuilder",
        ],
        &[
            "@log_to_table",
            "@log_database_name",
            "@log_schema_name",
            "@log_table_name_prefix",
            "@log_retention_days",
            "@output_database_name",
            "@output_schema_name",
            "@delete_retention_days",
        ],
        "output/logging parameters are blocked",
        "The DarlingData toolkit must be installed. \
         See: https://github.com/erikdarlingdata/DarlingData",
    )
}

/// Input for the pressure_detector tool (sp_PressureDetector).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PressureDetectorInput {
    /// Server name from list_servers
    pub server: String,
    /// What to check: "all", "cpu" or "memory"
    #[serde(default)]
    pub what_to_check: Option<String>,
    /// Skip the currently-running-queries section
    #[serde(default)]
    pub skip_queries: Option<bool>,
    /// Skip collecting plan XML
    #[serde(default)]
    pub skip_plan_xml: Option<bool>,
    /// Minimum disk latency to report, in milliseconds
    #[serde(default)]
    pub minimum_disk_latency_ms: Option<i32>,
    /// CPU utilization threshold percent
    #[serde(default)]
    pub cpu_utilization_threshold: Option<i32>,
    /// Skip wait stats collection
    #[serde(default)]
    pub skip_waits: Option<bool>,
    /// Skip perfmon counters
    #[serde(default)]
    pub skip_perfmon: Option<bool>,
    /// Sample interval in seconds
    #[serde(default)]
    pub sample_seconds: Option<i32>,
    /// Collect extra blocking details
    #[serde(default)]
    pub troubleshoot_blocking: Option<bool>,
    /// Run the more invasive checks
    #[serde(default)]
    pub gimme_danger: Option<bool>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the quickie_store tool (sp_QuickieStore, Query Store analysis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuickieStoreInput {
    /// Server name from list_servers
    pub server: String,
    /// Database whose Query Store should be analyzed
    #[serde(default)]
    pub database_name: Option<String>,
    /// Sort order: cpu, logical reads, duration, memory, executions...
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Number of queries to return
    #[serde(default)]
    pub top: Option<i32>,
    /// Analyze queries after this date (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Analyze queries before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Minimum execution count filter
    #[serde(default)]
    pub execution_count: Option<i32>,
    /// Minimum duration filter in milliseconds
    #[serde(default)]
    pub duration_ms: Option<i32>,
    /// Schema of a procedure to filter to
    #[serde(default)]
    pub procedure_schema: Option<String>,
    /// Procedure to filter to
    #[serde(default)]
    pub procedure_name: Option<String>,
    /// Comma-separated query IDs to include
    #[serde(default)]
    pub include_query_ids: Option<String>,
    /// Comma-separated query hashes to include
    #[serde(default)]
    pub include_query_hashes: Option<String>,
    /// Comma-separated plan IDs to ignore
    #[serde(default)]
    pub ignore_plan_ids: Option<String>,
    /// Comma-separated query IDs to ignore
    #[serde(default)]
    pub ignore_query_ids: Option<String>,
    /// Only queries whose text contains this string
    #[serde(default)]
    pub query_text_search: Option<String>,
    /// Exclude queries whose text contains this string
    #[serde(default)]
    pub query_text_search_not: Option<String>,
    /// Only queries with this wait category
    #[serde(default)]
    pub wait_filter: Option<String>,
    /// Query type filter: "ad hoc", "procs" or "functions"
    #[serde(default)]
    pub query_type: Option<String>,
    /// Return expert-mode columns
    #[serde(default)]
    pub expert_mode: Option<bool>,
    /// Format large numbers for readability
    #[serde(default)]
    pub format_output: Option<bool>,
    /// Analyze every database with Query Store enabled
    #[serde(default)]
    pub get_all_databases: Option<bool>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Keep the min/max/total metric columns in the output
    #[serde(default)]
    pub verbose_metrics: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the health_parser tool (sp_HealthParser, system_health analysis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HealthParserInput {
    /// Server name from list_servers
    pub server: String,
    /// What to check: "all", "waits", "disk", "cpu", "memory", "locking"...
    #[serde(default)]
    pub what_to_check: Option<String>,
    /// Analyze events after this date (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Analyze events before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Only return warning-level findings
    #[serde(default)]
    pub warnings_only: Option<bool>,
    /// Filter to one database
    #[serde(default)]
    pub database_name: Option<String>,
    /// Minimum wait duration filter, in milliseconds
    #[serde(default)]
    pub wait_duration_ms: Option<i32>,
    /// Interval for wait rollups, in minutes
    #[serde(default)]
    pub wait_round_interval_minutes: Option<i32>,
    /// Skip lock analysis
    #[serde(default)]
    pub skip_locks: Option<bool>,
    /// Pending task threshold
    #[serde(default)]
    pub pending_task_threshold: Option<i32>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Include deadlock/blocked-process XML report columns
    #[serde(default)]
    pub include_xml_reports: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Row cap per result set (honored even under verbose)
    #[serde(default)]
    pub max_rows: Option<usize>,
}

/// Input for the log_hunter tool (sp_LogHunter, error log search).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LogHunterInput {
    /// Server name from list_servers
    pub server: String,
    /// How many days of log to search. Default: 3
    #[serde(default)]
    pub days_back: Option<i32>,
    /// Search entries after this date (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Search entries before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Also search for this custom message text
    #[serde(default)]
    pub custom_message: Option<String>,
    /// Only return the custom message matches
    #[serde(default)]
    pub custom_message_only: Option<bool>,
    /// Search only the current log file. Default: true
    #[serde(default)]
    pub first_log_only: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Row cap per result set. Default: 200
    #[serde(default)]
    pub max_rows: Option<usize>,
}

/// Input for the human_events_block_viewer tool (sp_HumanEventsBlockViewer).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HumanEventsBlockViewerInput {
    /// Server name from list_servers
    pub server: String,
    /// Extended Event session to read. Default: blocked_process_report
    #[serde(default)]
    pub session_name: Option<String>,
    /// XE target type: "event_file" or "ring_buffer"
    #[serde(default)]
    pub target_type: Option<String>,
    /// Analyze events after this date (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Analyze events before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Filter to one database
    #[serde(default)]
    pub database_name: Option<String>,
    /// Filter to one object
    #[serde(default)]
    pub object_name: Option<String>,
    /// Cap on blocking events to analyze
    #[serde(default)]
    pub max_blocking_events: Option<i32>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Include the blocked-process-report XML column
    #[serde(default)]
    pub include_xml_reports: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Input for the index_cleanup tool (sp_IndexCleanup, unused index analysis).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IndexCleanupInput {
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
    /// Minimum reads filter
    #[serde(default)]
    pub min_reads: Option<i32>,
    /// Minimum writes filter
    #[serde(default)]
    pub min_writes: Option<i32>,
    /// Minimum index size filter, in GB
    #[serde(default)]
    pub min_size_gb: Option<i32>,
    /// Minimum row count filter
    #[serde(default)]
    pub min_rows: Option<i32>,
    /// Only report exact duplicate indexes
    #[serde(default)]
    pub dedupe_only: Option<bool>,
    /// Analyze every database
    #[serde(default)]
    pub get_all_databases: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Row cap per result set (honored even under verbose)
    #[serde(default)]
    pub max_rows: Option<usize>,
}

/// Input for the query_repro_builder tool (sp_QueryReproBuilder).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryReproBuilderInput {
    /// Server name from list_servers
    pub server: String,
    /// Database whose Query Store should be searched
    #[serde(default)]
    pub database_name: Option<String>,
    /// Search queries after this date (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Search queries before this date (ISO-8601)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Comma-separated plan IDs to include
    #[serde(default)]
    pub include_plan_ids: Option<String>,
    /// Comma-separated query IDs to include
    #[serde(default)]
    pub include_query_ids: Option<String>,
    /// Comma-separated plan IDs to ignore
    #[serde(default)]
    pub ignore_plan_ids: Option<String>,
    /// Comma-separated query IDs to ignore
    #[serde(default)]
    pub ignore_query_ids: Option<String>,
    /// Schema of a procedure to filter to
    #[serde(default)]
    pub procedure_schema: Option<String>,
    /// Procedure to filter to
    #[serde(default)]
    pub procedure_name: Option<String>,
    /// Only queries whose text contains this string
    #[serde(default)]
    pub query_text_search: Option<String>,
    /// Exclude queries whose text contains this string
    #[serde(default)]
    pub query_text_search_not: Option<String>,
    /// Include execution plan XML columns in the output
    #[serde(default)]
    pub include_query_plans: Option<bool>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Row cap per result set (honored even under verbose)
    #[serde(default)]
    pub max_rows: Option<usize>,
}

/// DarlingData handler: maps tool inputs to routine invocations.
#[derive(Debug)]
pub struct DarlingDataToolkit {
    gateway: Arc<ExecutionGateway>,
    catalog: ToolkitCatalog,
}

impl DarlingDataToolkit {
    pub fn new(gateway: Arc<ExecutionGateway>) -> Self {
        Self {
            gateway,
            catalog: catalog(),
        }
    }

    pub async fn pressure_detector(&self, input: PressureDetectorInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@what_to_check", input.what_to_check);
        add_flag_param(&mut parameters, "@skip_queries", input.skip_queries);

        // Plan XML is skipped unless explicitly requested.
        if input.include_query_plans == Some(true) {
            add_flag_param(
                &mut parameters,
                "@skip_plan_xml",
                Some(input.skip_plan_xml.unwrap_or(false)),
            );
        } else if input.skip_plan_xml.is_none() {
            add_flag_param(&mut parameters, "@skip_plan_xml", Some(true));
        } else {
            add_flag_param(&mut parameters, "@skip_plan_xml", input.skip_plan_xml);
        }

        add_param(
            &mut parameters,
            "@minimum_disk_latency_ms",
            input.minimum_disk_latency_ms,
        );
        add_param(
            &mut parameters,
            "@cpu_utilization_threshold",
            input.cpu_utilization_threshold,
        );
        add_flag_param(&mut parameters, "@skip_waits", input.skip_waits);
        add_flag_param(&mut parameters, "@skip_perfmon", input.skip_perfmon);
        add_param(&mut parameters, "@sample_seconds", input.sample_seconds);
        add_flag_param(
            &mut parameters,
            "@troubleshoot_blocking",
            input.troubleshoot_blocking,
        );
        add_flag_param(&mut parameters, "@gimme_danger", input.gimme_danger);

        let options = build_pressure_detector_options(input.include_query_plans, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_PressureDetector",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn quickie_store(&self, input: QuickieStoreInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@database_name", input.database_name);
        add_param(&mut parameters, "@sort_order", input.sort_order);
        add_param(&mut parameters, "@top", input.top);
        add_param(&mut parameters, "@start_date", input.start_date);
        add_param(&mut parameters, "@end_date", input.end_date);
        add_param(&mut parameters, "@execution_count", input.execution_count);
        add_param(&mut parameters, "@duration_ms", input.duration_ms);
        add_param(&mut parameters, "@procedure_schema", input.procedure_schema);
        add_param(&mut parameters, "@procedure_name", input.procedure_name);
        add_param(
            &mut parameters,
            "@include_query_ids",
            input.include_query_ids,
        );
        add_param(
            &mut parameters,
            "@include_query_hashes",
            input.include_query_hashes,
        );
        add_param(&mut parameters, "@ignore_plan_ids", input.ignore_plan_ids);
        add_param(&mut parameters, "@ignore_query_ids", input.ignore_query_ids);
        add_param(
            &mut parameters,
            "@query_text_search",
            input.query_text_search,
        );
        add_param(
            &mut parameters,
            "@query_text_search_not",
            input.query_text_search_not,
        );
        add_param(&mut parameters, "@wait_filter", input.wait_filter);
        add_param(&mut parameters, "@query_type", input.query_type);
        add_flag_param(&mut parameters, "@expert_mode", input.expert_mode);
        add_flag_param(
            &mut parameters,
            "@format_output",
            Some(input.format_output.unwrap_or(false)),
        );
        add_flag_param(&mut parameters, "@get_all_databases", input.get_all_databases);
        // The help table result set is noise for a machine caller.
        add_flag_param(&mut parameters, "@hide_help_table", Some(true));

        let options = build_quickie_store_options(
            input.include_query_plans,
            input.verbose_metrics,
            input.verbose,
        );
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_QuickieStore",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn health_parser(&self, input: HealthParserInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@what_to_check", input.what_to_check);
        add_param(&mut parameters, "@start_date", input.start_date);
        add_param(&mut parameters, "@end_date", input.end_date);
        add_flag_param(&mut parameters, "@warnings_only", input.warnings_only);
        add_param(&mut parameters, "@database_name", input.database_name);
        add_param(&mut parameters, "@wait_duration_ms", input.wait_duration_ms);
        add_param(
            &mut parameters,
            "@wait_round_interval_minutes",
            input.wait_round_interval_minutes,
        );
        add_flag_param(&mut parameters, "@skip_locks", input.skip_locks);
        add_param(
            &mut parameters,
            "@pending_task_threshold",
            input.pending_task_threshold,
        );

        let options = build_health_parser_options(
            input.include_query_plans,
            input.include_xml_reports,
            input.verbose,
            input.max_rows,
        );
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_HealthParser",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn log_hunter(&self, input: LogHunterInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        // sp_LogHunter counts days back as a negative offset.
        add_param(
            &mut parameters,
            "@days_back",
            Some(-input.days_back.unwrap_or(3).abs()),
        );
        add_param(&mut parameters, "@start_date", input.start_date);
        add_param(&mut parameters, "@end_date", input.end_date);
        add_param(&mut parameters, "@custom_message", input.custom_message);
        add_flag_param(
            &mut parameters,
            "@custom_message_only",
            input.custom_message_only,
        );
        add_flag_param(
            &mut parameters,
            "@first_log_only",
            Some(input.first_log_only.unwrap_or(true)),
        );

        let options = build_log_hunter_options(input.verbose, input.max_rows);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_LogHunter",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn human_events_block_viewer(
        &self,
        input: HumanEventsBlockViewerInput,
    ) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@session_name", input.session_name);
        add_param(&mut parameters, "@target_type", input.target_type);
        add_param(&mut parameters, "@start_date", input.start_date);
        add_param(&mut parameters, "@end_date", input.end_date);
        add_param(&mut parameters, "@database_name", input.database_name);
        add_param(&mut parameters, "@object_name", input.object_name);
        add_param(
            &mut parameters,
            "@max_blocking_events",
            input.max_blocking_events,
        );

        let options = build_human_events_block_viewer_options(
            input.include_query_plans,
            input.include_xml_reports,
            input.verbose,
        );
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_HumanEventsBlockViewer",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn index_cleanup(&self, input: IndexCleanupInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@database_name", input.database_name);
        add_param(&mut parameters, "@schema_name", input.schema_name);
        add_param(&mut parameters, "@table_name", input.table_name);
        add_param(&mut parameters, "@min_reads", input.min_reads);
        add_param(&mut parameters, "@min_writes", input.min_writes);
        add_param(&mut parameters, "@min_size_gb", input.min_size_gb);
        add_param(&mut parameters, "@min_rows", input.min_rows);
        add_flag_param(&mut parameters, "@dedupe_only", input.dedupe_only);
        add_flag_param(&mut parameters, "@get_all_databases", input.get_all_databases);

        let options = build_index_cleanup_options(input.verbose, input.max_rows);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_IndexCleanup",
                parameters,
                Some(options),
            )
            .await
    }

    pub async fn query_repro_builder(&self, input: QueryReproBuilderInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@database_name", input.database_name);
        add_param(&mut parameters, "@start_date", input.start_date);
        add_param(&mut parameters, "@end_date", input.end_date);
        add_param(&mut parameters, "@include_plan_ids", input.include_plan_ids);
        add_param(
            &mut parameters,
            "@include_query_ids",
            input.include_query_ids,
        );
        add_param(&mut parameters, "@ignore_plan_ids", input.ignore_plan_ids);
        add_param(&mut parameters, "@ignore_query_ids", input.ignore_query_ids);
        add_param(&mut parameters, "@procedure_schema", input.procedure_schema);
        add_param(&mut parameters, "@procedure_name", input.procedure_name);
        add_param(
            &mut parameters,
            "@query_text_search",
            input.query_text_search,
        );
        add_param(
            &mut parameters,
            "@query_text_search_not",
            input.query_text_search_not,
        );

        let options =
            build_query_repro_builder_options(input.include_query_plans, input.verbose, input.max_rows);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_QueryReproBuilder",
                parameters,
                Some(options),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Format option factories
// ---------------------------------------------------------------------------

pub fn build_pressure_detector_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&["query_plan", "live_query_plan"]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
        excluded.remove("live_query_plan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("sql_text", 1000), ("tempdb_info", 2000)]),
        ..Default::default()
    }
}

/// Metric columns sp_QuickieStore emits under min_/max_/total_ prefixes.
const QUICKIE_STORE_METRICS: &[&str] = &[
    "grant_kb",
    "used_grant_kb",
    "ideal_grant_kb",
    "reserved_threads",
    "used_threads",
    "columnstore_segment_reads",
    "columnstore_segment_skips",
    "spills",
    "grant_mb",
    "used_grant_mb",
    "duration_ms",
    "cpu_time_ms",
    "logical_io_reads",
    "logical_io_writes",
    "physical_io_reads",
    "clr_time_ms",
    "query_used_memory",
    "rowcount",
    "log_bytes_used",
    "tempdb_space_used",
];

pub fn build_quickie_store_options(
    include_query_plans: Option<bool>,
    verbose_metrics: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&["query_plan"]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
    }

    if verbose_metrics != Some(true) {
        for prefix in ["min_", "max_", "total_"] {
            for metric in QUICKIE_STORE_METRICS {
                excluded.insert(format!("{}{}", prefix, metric));
            }
        }
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("query_sql_text", 1000)]),
        ..Default::default()
    }
}

pub fn build_health_parser_options(
    _include_query_plans: Option<bool>,
    include_xml_reports: Option<bool>,
    verbose: Option<bool>,
    max_rows: Option<usize>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions {
            max_rows_override: max_rows,
            ..FormatOptions::unbounded()
        };
    }

    let mut excluded = column_set(&[
        "deadlock_graph",
        "xml_deadlock_report",
        "blocked_process_report",
    ]);
    if include_xml_reports == Some(true) {
        excluded.remove("deadlock_graph");
        excluded.remove("xml_deadlock_report");
        excluded.remove("blocked_process_report");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("query_text", 1000)]),
        max_rows_override: max_rows,
        ..Default::default()
    }
}

pub fn build_log_hunter_options(verbose: Option<bool>, max_rows: Option<usize>) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions {
            max_rows_override: max_rows,
            ..FormatOptions::unbounded()
        };
    }

    FormatOptions {
        max_rows_override: Some(max_rows.unwrap_or(LOG_HUNTER_DEFAULT_MAX_ROWS)),
        truncated_columns: column_limits(&[("text", 500)]),
        ..Default::default()
    }
}

pub fn build_human_events_block_viewer_options(
    include_query_plans: Option<bool>,
    include_xml_reports: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    let mut excluded = column_set(&[
        "query_plan",
        "blocked_process_report_xml",
        "sql_handle",
        "statement_start_offset",
        "statement_end_offset",
    ]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
    }
    if include_xml_reports == Some(true) {
        excluded.remove("blocked_process_report_xml");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("query_text", 1000)]),
        ..Default::default()
    }
}

pub fn build_index_cleanup_options(
    verbose: Option<bool>,
    max_rows: Option<usize>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions {
            max_rows_override: max_rows,
            ..FormatOptions::unbounded()
        };
    }

    FormatOptions {
        truncated_columns: column_limits(&[("original_index_definition", 500)]),
        max_rows_override: max_rows,
        ..Default::default()
    }
}

pub fn build_query_repro_builder_options(
    include_query_plans: Option<bool>,
    verbose: Option<bool>,
    max_rows: Option<usize>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions {
            max_rows_override: max_rows,
            ..FormatOptions::unbounded()
        };
    }

    let mut excluded = column_set(&["query_plan"]);
    if include_query_plans == Some(true) {
        excluded.remove("query_plan");
    }

    FormatOptions {
        excluded_columns: excluded,
        truncated_columns: column_limits(&[("query_sql_text", 1000)]),
        max_rows_override: max_rows,
        ..Default::default()
    }
}
