//! sp_WhoIsActive toolkit.
//!
//! Single routine, but with its own output-column plumbing: the procedure
//! takes an `@output_column_list` parameter, so the default and compact modes
//! shrink the result server-side instead of relying on column exclusion.

use crate::db::params::{RoutineParams, add_flag_param, add_param, set_param};
use crate::error::DiagResult;
use crate::gate::format::{FormatOptions, column_limits};
use crate::gate::{ExecutionGateway, ToolkitCatalog};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Columns requested from sp_WhoIsActive by default.
pub const DEFAULT_OUTPUT_COLUMN_LIST: &str =
    "[session_id][status][wait_info][blocking_session_id][blocked_session_count]\
     [percent_complete][start_time][elapsed_time][cpu][reads][writes]\
     [tempdb_current][tempdb_allocations][open_tran_count][sql_text][sql_command]\
     [database_name][program_name][host_name][login_name]";

/// Reduced column list used in compact mode.
pub const COMPACT_OUTPUT_COLUMN_LIST: &str =
    "[session_id][status][wait_info][blocking_session_id][blocked_session_count]\
     [start_time][elapsed_time][cpu][reads][writes]\
     [sql_text][database_name][program_name]";

/// Build the sp_WhoIsActive safety catalog.
pub fn catalog() -> ToolkitCatalog {
    ToolkitCatalog::new(
        "who-is-active",
        &["sp_WhoIsActive"],
        &["@destination_table", "@return_schema", "@schema", "@help"],
        "output/schema parameters are blocked",
        "sp_WhoIsActive must be installed. \
         See: https://github.com/amachanic/sp_whoisactive",
    )
}

/// Input for the who_is_active tool (sp_WhoIsActive session activity).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WhoIsActiveInput {
    /// Server name from list_servers
    pub server: String,
    /// Filter value (session id, login, host, database or program)
    #[serde(default)]
    pub filter: Option<String>,
    /// Filter type: session, program, database, login or host
    #[serde(default)]
    pub filter_type: Option<String>,
    /// Exclusion filter value
    #[serde(default)]
    pub not_filter: Option<String>,
    /// Exclusion filter type
    #[serde(default)]
    pub not_filter_type: Option<String>,
    /// Include the calling session
    #[serde(default)]
    pub show_own_spid: Option<bool>,
    /// Include system sessions
    #[serde(default)]
    pub show_system_spids: Option<bool>,
    /// Sleeping session mode: 0=none, 1=those with open transactions, 2=all
    #[serde(default)]
    pub show_sleeping_spids: Option<i32>,
    /// Pull the complete command text instead of the active statement
    #[serde(default)]
    pub get_full_inner_text: Option<bool>,
    /// Plan mode: 0=none, 1=plan for the active statement, 2=whole batch plan
    #[serde(default)]
    pub get_plans: Option<i32>,
    /// Include the outermost command text
    #[serde(default)]
    pub get_outer_command: Option<bool>,
    /// Include transaction log details
    #[serde(default)]
    pub get_transaction_info: Option<bool>,
    /// Task detail mode: 0=none, 1=lightweight, 2=all
    #[serde(default)]
    pub get_task_info: Option<i32>,
    /// Include lock information (XML column)
    #[serde(default)]
    pub get_locks: Option<bool>,
    /// Include average CPU time. Default: true
    #[serde(default)]
    pub get_avg_time: Option<bool>,
    /// Include additional session-level details
    #[serde(default)]
    pub get_additional_info: Option<bool>,
    /// Include memory grant details
    #[serde(default)]
    pub get_memory_info: Option<bool>,
    /// Mark sessions at the head of blocking chains. Default: true
    #[serde(default)]
    pub find_block_leaders: Option<bool>,
    /// Capture a delta over this many seconds
    #[serde(default)]
    pub delta_interval: Option<i32>,
    /// Sort order for the session list
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Format numbers for human readability. Default: false
    #[serde(default)]
    pub format_output: Option<bool>,
    /// Reduced column set with a 500-char string cap
    #[serde(default)]
    pub compact: Option<bool>,
    /// Explicit @output_column_list override
    #[serde(default)]
    pub output_column_list: Option<String>,
    /// Return every column untruncated
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// sp_WhoIsActive handler.
#[derive(Debug)]
pub struct WhoIsActiveToolkit {
    gateway: Arc<ExecutionGateway>,
    catalog: ToolkitCatalog,
}

impl WhoIsActiveToolkit {
    pub fn new(gateway: Arc<ExecutionGateway>) -> Self {
        Self {
            gateway,
            catalog: catalog(),
        }
    }

    pub async fn who_is_active(&self, input: WhoIsActiveInput) -> DiagResult<String> {
        let mut parameters = RoutineParams::new();
        add_param(&mut parameters, "@filter", input.filter);
        add_param(&mut parameters, "@filter_type", input.filter_type);
        add_param(&mut parameters, "@not_filter", input.not_filter);
        add_param(&mut parameters, "@not_filter_type", input.not_filter_type);
        add_flag_param(&mut parameters, "@show_own_spid", input.show_own_spid);
        add_flag_param(
            &mut parameters,
            "@show_system_spids",
            input.show_system_spids,
        );
        add_param(
            &mut parameters,
            "@show_sleeping_spids",
            input.show_sleeping_spids,
        );
        add_flag_param(
            &mut parameters,
            "@get_full_inner_text",
            input.get_full_inner_text,
        );
        add_param(&mut parameters, "@get_plans", input.get_plans);
        add_flag_param(&mut parameters, "@get_outer_command", input.get_outer_command);
        add_flag_param(
            &mut parameters,
            "@get_transaction_info",
            input.get_transaction_info,
        );
        add_param(&mut parameters, "@get_task_info", input.get_task_info);
        add_flag_param(&mut parameters, "@get_locks", input.get_locks);
        add_flag_param(
            &mut parameters,
            "@get_avg_time",
            Some(input.get_avg_time.unwrap_or(true)),
        );
        add_flag_param(
            &mut parameters,
            "@get_additional_info",
            input.get_additional_info,
        );
        add_flag_param(&mut parameters, "@get_memory_info", input.get_memory_info);
        add_flag_param(
            &mut parameters,
            "@find_block_leaders",
            Some(input.find_block_leaders.unwrap_or(true)),
        );
        add_param(&mut parameters, "@delta_interval", input.delta_interval);
        add_param(&mut parameters, "@sort_order", input.sort_order);
        add_flag_param(
            &mut parameters,
            "@format_output",
            Some(input.format_output.unwrap_or(false)),
        );

        // Output column list precedence: explicit override > compact > default.
        // Verbose sends none so the procedure returns its full native set.
        if input.verbose != Some(true) {
            let column_list = match (&input.output_column_list, input.compact) {
                (Some(explicit), _) => explicit.clone(),
                (None, Some(true)) => COMPACT_OUTPUT_COLUMN_LIST.to_string(),
                _ => DEFAULT_OUTPUT_COLUMN_LIST.to_string(),
            };
            set_param(&mut parameters, "@output_column_list", column_list);
        }

        let options = build_who_is_active_options(input.compact, input.verbose);
        self.gateway
            .execute_routine(
                &self.catalog,
                &input.server,
                "sp_WhoIsActive",
                parameters,
                Some(options),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Format option factory
// ---------------------------------------------------------------------------

pub fn build_who_is_active_options(
    compact: Option<bool>,
    verbose: Option<bool>,
) -> FormatOptions {
    if verbose == Some(true) {
        return FormatOptions::unbounded();
    }

    if compact == Some(true) {
        return FormatOptions {
            max_string_length: Some(500),
            ..Default::default()
        };
    }

    FormatOptions {
        truncated_columns: column_limits(&[
            ("sql_text", 4000),
            ("sql_command", 4000),
            ("query_plan", 500),
            ("locks", 2000),
            ("additional_info", 2000),
            ("memory_info", 1000),
        ]),
        ..Default::default()
    }
}
