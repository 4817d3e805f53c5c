//! Read-only validation for ad-hoc SQL text.
//!
//! The `read_data` tool has no routine name for the allow-list to check, so
//! it gets a simpler predicate instead: the statement must parse as T-SQL and
//! every parsed statement must be a plain query. Write operations, DDL,
//! transaction control and procedure calls are rejected with messages that
//! point at the right tool.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) so formatting tricks and
//! comment games cannot smuggle a write through.

use crate::error::{DiagError, DiagResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

/// Validate SQL for read-only execution.
///
/// Returns `Ok(())` when every statement is a SELECT-style query, or
/// `Err(DiagError::InvalidInput)` naming the offending operation.
///
/// # Examples
///
/// ```
/// use sqldiag_mcp_server::gate::validator::validate_readonly;
///
/// assert!(validate_readonly("SELECT name FROM sys.databases").is_ok());
/// assert!(validate_readonly("DROP TABLE users").is_err());
/// ```
pub fn validate_readonly(sql: &str) -> DiagResult<()> {
    let dialect = MsSqlDialect {};

    let statements = Parser::parse_sql(&dialect, sql)
        .map_err(|e| DiagError::invalid_input(format!("Failed to parse SQL statement: {}", e)))?;

    if statements.is_empty() {
        return Err(DiagError::invalid_input("Empty SQL statement"));
    }

    for stmt in &statements {
        validate_statement(stmt)?;
    }

    Ok(())
}

/// Validate a single parsed statement.
fn validate_statement(stmt: &Statement) -> DiagResult<()> {
    match stmt {
        Statement::Query(_) => Ok(()),
        Statement::Insert(_) | Statement::Update { .. } | Statement::Delete(_) => {
            Err(DiagError::invalid_input(
                "Write operations are not allowed in read_data. Only SELECT queries are accepted.",
            ))
        }
        Statement::CreateTable { .. }
        | Statement::CreateIndex(_)
        | Statement::CreateView { .. }
        | Statement::AlterTable { .. }
        | Statement::Drop { .. }
        | Statement::Truncate { .. } => Err(DiagError::invalid_input(
            "DDL operations are not allowed in read_data. Only SELECT queries are accepted.",
        )),
        Statement::StartTransaction { .. }
        | Statement::Commit { .. }
        | Statement::Rollback { .. } => Err(DiagError::invalid_input(
            "Transaction control is not allowed in read_data.",
        )),
        Statement::Execute { .. } | Statement::Call { .. } => Err(DiagError::invalid_input(
            "Procedure calls are not allowed in read_data. Use the diagnostic tools instead.",
        )),
        other => Err(DiagError::invalid_input(format!(
            "Statement is not allowed in read_data. Only SELECT queries are accepted (found: {}).",
            statement_label(other)
        ))),
    }
}

/// Short label for an arbitrary statement, used in error messages.
fn statement_label(stmt: &Statement) -> String {
    let rendered = stmt.to_string();
    rendered
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_allowed() {
        assert!(validate_readonly("SELECT * FROM sys.dm_exec_sessions").is_ok());
    }

    #[test]
    fn test_select_with_cte_allowed() {
        let sql = "WITH w AS (SELECT wait_type, wait_time_ms FROM sys.dm_os_wait_stats) \
                   SELECT TOP 10 * FROM w ORDER BY wait_time_ms DESC";
        assert!(validate_readonly(sql).is_ok());
    }

    #[test]
    fn test_insert_rejected() {
        let err = validate_readonly("INSERT INTO t (id) VALUES (1)").unwrap_err();
        assert!(matches!(err, DiagError::InvalidInput { .. }));
        assert!(err.to_string().contains("Write operations"));
    }

    #[test]
    fn test_update_rejected() {
        assert!(validate_readonly("UPDATE t SET x = 1 WHERE id = 2").is_err());
    }

    #[test]
    fn test_delete_rejected() {
        assert!(validate_readonly("DELETE FROM t WHERE id = 1").is_err());
    }

    #[test]
    fn test_drop_rejected() {
        let err = validate_readonly("DROP TABLE users").unwrap_err();
        assert!(err.to_string().contains("DDL"));
    }

    #[test]
    fn test_truncate_rejected() {
        assert!(validate_readonly("TRUNCATE TABLE logs").is_err());
    }

    #[test]
    fn test_exec_rejected() {
        let err = validate_readonly("EXECUTE sp_Blitz").unwrap_err();
        assert!(err.to_string().contains("Procedure calls"));
    }

    #[test]
    fn test_transaction_control_rejected() {
        assert!(validate_readonly("BEGIN TRANSACTION").is_err());
    }

    #[test]
    fn test_multi_statement_with_write_rejected() {
        assert!(validate_readonly("SELECT 1; DELETE FROM t").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate_readonly("").is_err());
        assert!(validate_readonly("   ").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_readonly("NOT REALLY SQL AT ALL").is_err());
    }
}
