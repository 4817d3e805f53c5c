//! The execution gateway.
//!
//! Every diagnostic call flows admission -> safety check -> execution ->
//! shaping. The [`ExecutionGateway`] orchestrates that pipeline: it acquires
//! an admission lease, runs the toolkit safety checks before any I/O,
//! resolves the target server, opens a fresh connection, executes, shapes the
//! result sets to JSON, and releases the lease on every exit path.

pub mod admission;
pub mod format;
pub mod safety;
pub mod shaper;
pub mod validator;

pub use admission::{AdmissionControl, QueryGovernor, QueryLease};
pub use format::{FormatOptions, GLOBAL_MAX_STRING_LENGTH, TRUNCATION_SUFFIX};
pub use safety::ToolkitCatalog;
pub use shaper::{ResultCursor, ShapedResultSet, shape_result_sets};

use crate::db::client::SqlClient;
use crate::db::params::RoutineParams;
use crate::db::registry::ServerRegistry;
use crate::error::{DiagError, DiagResult, PROCEDURE_NOT_FOUND_CODE};
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

/// Execution limits applied to every request.
#[derive(Debug, Clone)]
pub struct GatewayLimits {
    /// Statement timeout covering execution and result streaming.
    pub command_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Server-side default row cap per result set.
    pub max_rows: usize,
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_rows: 1000,
        }
    }
}

/// Orchestrates admission, safety, execution and shaping for one server
/// registry.
#[derive(Debug)]
pub struct ExecutionGateway {
    registry: ServerRegistry,
    admission: AdmissionControl,
    limits: GatewayLimits,
}

impl ExecutionGateway {
    pub fn new(
        registry: ServerRegistry,
        admission: AdmissionControl,
        limits: GatewayLimits,
    ) -> Self {
        Self {
            registry,
            admission,
            limits,
        }
    }

    /// All configured server names, sorted.
    pub fn server_names(&self) -> Vec<String> {
        self.registry.server_names()
    }

    /// Execute an allow-listed stored procedure and shape its result sets.
    ///
    /// Safety checks run after the lease is granted and before any network
    /// call: the routine check first, then every supplied parameter name.
    pub async fn execute_routine(
        &self,
        toolkit: &ToolkitCatalog,
        server_name: &str,
        routine: &str,
        parameters: RoutineParams,
        options: Option<FormatOptions>,
    ) -> DiagResult<String> {
        let _lease = self.admission.acquire().await?;

        toolkit.check_routine(routine)?;
        toolkit.check_parameters(parameters.iter().map(|(name, _)| name.as_str()))?;

        let server = self.registry.resolve(server_name)?;

        info!(
            toolkit = toolkit.name(),
            server = server_name,
            routine = routine,
            parameters = parameters.len(),
            "Executing diagnostic routine"
        );

        let mut client =
            SqlClient::connect(server.connection_string(), self.limits.connect_timeout).await?;

        let shaped = timeout(self.limits.command_timeout, async {
            let mut cursor = client.execute_routine(routine, &parameters).await?;
            shape_result_sets(&mut cursor, options.as_ref(), self.limits.max_rows).await
        })
        .await
        .map_err(|_| {
            DiagError::timeout("routine execution", self.limits.command_timeout.as_secs())
        })?
        .map_err(|e| match e.server_error_code() {
            Some(PROCEDURE_NOT_FOUND_CODE) => DiagError::routine_not_installed(
                routine,
                server_name,
                toolkit.not_installed_hint(),
            ),
            _ => e,
        })?;

        Ok(shaped)
    }

    /// Execute ad-hoc read-only SQL and shape its result sets.
    ///
    /// There is no routine name for the allow-list, so the text goes through
    /// the read-only validator instead; admission control still applies.
    pub async fn execute_query(
        &self,
        server_name: &str,
        database: Option<&str>,
        sql: &str,
    ) -> DiagResult<String> {
        validator::validate_readonly(sql)?;

        let _lease = self.admission.acquire().await?;

        let server = self.registry.resolve(server_name)?;

        info!(
            server = server_name,
            sql_len = sql.len(),
            "Executing ad-hoc query"
        );

        let mut client =
            SqlClient::connect(server.connection_string(), self.limits.connect_timeout).await?;

        if let Some(database) = database {
            client.use_database(database).await?;
        }

        timeout(self.limits.command_timeout, async {
            let mut cursor = client.execute_sql(sql).await?;
            shape_result_sets(&mut cursor, None, self.limits.max_rows).await
        })
        .await
        .map_err(|_| DiagError::timeout("query execution", self.limits.command_timeout.as_secs()))?
    }
}
