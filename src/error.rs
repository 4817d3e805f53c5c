//! Error types for the SQL diagnostics MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Each variant carries an actionable message so AI assistants can
//! understand what went wrong and how to recover.

use thiserror::Error;

/// SQL Server error number for "Could not find stored procedure".
pub const PROCEDURE_NOT_FOUND_CODE: u32 = 2812;

#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Server '{server}' not found. Available servers: {available}")]
    UnknownServer { server: String, available: String },

    #[error("Procedure '{routine}' is not in the allowed list.")]
    UnauthorizedRoutine { routine: String },

    #[error("Parameter '{parameter}' is not allowed ({reason}).")]
    BlockedParameter { parameter: String, reason: String },

    #[error("Stored procedure '{routine}' not found on server '{server}'. {hint}")]
    RoutineNotInstalled {
        routine: String,
        server: String,
        hint: String,
    },

    /// Database-layer failure surfaced verbatim. `code` is the server-side
    /// error number when the failure came from the database engine itself.
    #[error("Query execution failed: {message}")]
    ExecutionFailed { message: String, code: Option<u32> },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DiagError {
    /// Create an unknown server error listing the configured server names.
    pub fn unknown_server(server: impl Into<String>, names: &[String]) -> Self {
        Self::UnknownServer {
            server: server.into(),
            available: names.join(", "),
        }
    }

    /// Create an unauthorized routine error.
    pub fn unauthorized_routine(routine: impl Into<String>) -> Self {
        Self::UnauthorizedRoutine {
            routine: routine.into(),
        }
    }

    /// Create a blocked parameter error with the toolkit's reason string.
    pub fn blocked_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BlockedParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a routine-not-installed error with the toolkit's install hint.
    pub fn routine_not_installed(
        routine: impl Into<String>,
        server: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::RoutineNotInstalled {
            routine: routine.into(),
            server: server.into(),
            hint: hint.into(),
        }
    }

    /// Create an execution error from a database-layer message.
    pub fn execution_failed(message: impl Into<String>, code: Option<u32>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
            code,
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The server-side error number, when the failure originated in the
    /// database engine.
    pub fn server_error_code(&self) -> Option<u32> {
        match self {
            Self::ExecutionFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert tiberius errors to DiagError.
///
/// Server-side errors (wrong syntax, permissions, missing objects) keep their
/// message verbatim along with the engine error number; transport-level
/// failures become connection errors with a recovery suggestion.
impl From<tiberius::error::Error> for DiagError {
    fn from(err: tiberius::error::Error) -> Self {
        use tiberius::error::Error;
        match err {
            Error::Server(token) => {
                DiagError::execution_failed(token.message().to_string(), Some(token.code()))
            }
            Error::Io { message, .. } => DiagError::connection(
                format!("I/O error: {}", message),
                "Check network connectivity and database server status",
            ),
            Error::Tls(message) => DiagError::connection(
                format!("TLS error: {}", message),
                "Verify the encryption settings in the connection string",
            ),
            Error::Routing { host, port } => DiagError::connection(
                format!("Server requested rerouting to {}:{}", host, port),
                "Connect to the routing target directly",
            ),
            Error::Protocol(msg) => DiagError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            other => DiagError::internal(format!("Unexpected driver error: {}", other)),
        }
    }
}

/// Result type alias for gateway operations.
pub type DiagResult<T> = Result<T, DiagError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DiagError to MCP ErrorData for semantic error categorization.
///
/// Safety violations and bad input map to invalid_params (never retried),
/// unknown servers and missing toolkits map to resource_not_found, and
/// execution/transport failures map to internal_error.
impl From<DiagError> for rmcp::ErrorData {
    fn from(err: DiagError) -> Self {
        match &err {
            DiagError::UnauthorizedRoutine { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            DiagError::BlockedParameter { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            DiagError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }

            DiagError::UnknownServer { available, .. } => {
                let available = available.clone();
                rmcp::ErrorData::resource_not_found(
                    err.to_string(),
                    suggestion_data(Some(&format!("Use one of: {}", available))),
                )
            }
            DiagError::RoutineNotInstalled { hint, .. } => {
                let hint = hint.clone();
                rmcp::ErrorData::resource_not_found(err.to_string(), suggestion_data(Some(&hint)))
            }

            DiagError::Connection { suggestion, .. } => {
                let suggestion = suggestion.clone();
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(Some(&suggestion)))
            }
            DiagError::Timeout { .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                suggestion_data(Some(
                    "Consider increasing the command timeout or narrowing the request",
                )),
            ),
            DiagError::ExecutionFailed { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), None)
            }
            DiagError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_server_lists_available() {
        let err = DiagError::unknown_server("prod", &["dev".to_string(), "staging".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("Server 'prod' not found"));
        assert!(msg.contains("dev, staging"));
    }

    #[test]
    fn test_unauthorized_routine_message() {
        let err = DiagError::unauthorized_routine("sp_Evil");
        let msg = err.to_string();
        assert!(msg.contains("sp_Evil"));
        assert!(msg.contains("not in the allowed list"));
    }

    #[test]
    fn test_blocked_parameter_message() {
        let err = DiagError::blocked_parameter("@OutputTableName", "output parameters are blocked");
        let msg = err.to_string();
        assert!(msg.contains("@OutputTableName"));
        assert!(msg.contains("not allowed"));
        assert!(msg.contains("output parameters are blocked"));
    }

    #[test]
    fn test_routine_not_installed_includes_hint() {
        let err = DiagError::routine_not_installed("sp_Blitz", "prod", "Install the kit first.");
        let msg = err.to_string();
        assert!(msg.contains("sp_Blitz"));
        assert!(msg.contains("prod"));
        assert!(msg.contains("Install the kit first."));
    }

    #[test]
    fn test_execution_failed_keeps_code() {
        let err =
            DiagError::execution_failed("Could not find stored procedure 'sp_Blitz'.", Some(2812));
        assert_eq!(err.server_error_code(), Some(PROCEDURE_NOT_FOUND_CODE));
    }

    #[test]
    fn test_error_retryable() {
        assert!(DiagError::timeout("query", 30).is_retryable());
        assert!(DiagError::connection("err", "sugg").is_retryable());
        assert!(!DiagError::unauthorized_routine("sp_Evil").is_retryable());
    }

    // Tests for From<DiagError> for rmcp::ErrorData

    #[test]
    fn test_unauthorized_routine_maps_to_invalid_params() {
        let err = DiagError::unauthorized_routine("sp_Evil");
        let mcp_err: rmcp::ErrorData = err.into();
        // invalid_params uses -32602
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_blocked_parameter_maps_to_invalid_params() {
        let err = DiagError::blocked_parameter("@OutputTableName", "blocked");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_unknown_server_maps_to_resource_not_found() {
        let err = DiagError::unknown_server("prod", &[]);
        let mcp_err: rmcp::ErrorData = err.into();
        // resource_not_found uses -32002 in rmcp
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_routine_not_installed_maps_to_resource_not_found() {
        let err = DiagError::routine_not_installed("sp_Blitz", "prod", "hint");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_execution_failed_maps_to_internal_error() {
        let err = DiagError::execution_failed("boom", None);
        let mcp_err: rmcp::ErrorData = err.into();
        // internal_error uses -32603
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_routine_not_installed_includes_hint_in_data() {
        let err = DiagError::routine_not_installed("sp_Blitz", "prod", "install the toolkit");
        let mcp_err: rmcp::ErrorData = err.into();
        let data = mcp_err.data.expect("hint data");
        assert_eq!(data["suggestion"], "install the toolkit");
    }
}
