//! SQL Server client built on tiberius.
//!
//! Connections are opened fresh per request and dropped at the end of the
//! request scope; pooling is deliberately not done in this layer. The
//! [`SqlCursor`] adapter exposes the TDS `QueryStream` through the
//! [`ResultCursor`] trait the result shaper consumes: a forward-only walk
//! over result sets where advancing discards unread rows of the current set.

use crate::db::params::{RoutineParam, RoutineParams};
use crate::db::value::SqlValue;
use crate::error::{DiagError, DiagResult};
use crate::gate::shaper::ResultCursor;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use std::time::Duration;
use tiberius::{Client, ColumnData, Config, FromSql, Query, QueryItem, QueryStream};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// One per-request connection to a SQL Server instance.
pub struct SqlClient {
    inner: Client<Compat<TcpStream>>,
}

impl SqlClient {
    /// Open a fresh connection from an ADO.NET-style connection string.
    pub async fn connect(connection_string: &str, connect_timeout: Duration) -> DiagResult<Self> {
        let config = Config::from_ado_string(connection_string).map_err(|e| {
            DiagError::connection(
                format!("Invalid connection string: {}", e),
                "Check the connection string format and credentials",
            )
        })?;

        let addr = config.get_addr();
        debug!(addr = %addr, "Opening TDS connection");

        let tcp = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| DiagError::timeout("connection open", connect_timeout.as_secs()))?
            .map_err(|e| {
                DiagError::connection(
                    format!("TCP connect failed: {}", e),
                    "Check the server address and network connectivity",
                )
            })?;
        tcp.set_nodelay(true).map_err(|e| {
            DiagError::connection(
                format!("Failed to configure socket: {}", e),
                "Check the network stack",
            )
        })?;

        let inner = Client::connect(config, tcp.compat_write())
            .await
            .map_err(DiagError::from)?;

        Ok(Self { inner })
    }

    /// Execute a stored procedure with named parameters, returning the
    /// multi-result-set cursor.
    ///
    /// The statement is rendered as `EXEC [routine] @Name = @P1, ...` with
    /// every value bound positionally; routine and parameter names are
    /// restricted to identifier characters before being interpolated.
    pub async fn execute_routine(
        &mut self,
        routine: &str,
        parameters: &RoutineParams,
    ) -> DiagResult<SqlCursor<'_>> {
        let sql = build_exec_statement(routine, parameters)?;
        debug!(sql = %sql, "Executing stored procedure");

        let mut query = Query::new(sql);
        for (_, param) in parameters {
            bind_param(&mut query, param);
        }

        let stream = query.query(&mut self.inner).await.map_err(DiagError::from)?;
        Ok(SqlCursor::new(stream))
    }

    /// Execute literal SQL text, returning the multi-result-set cursor.
    pub async fn execute_sql(&mut self, sql: &str) -> DiagResult<SqlCursor<'_>> {
        debug!(sql_len = sql.len(), "Executing ad-hoc SQL");
        let stream = self
            .inner
            .simple_query(sql.to_string())
            .await
            .map_err(DiagError::from)?;
        Ok(SqlCursor::new(stream))
    }

    /// Switch the connection's database context.
    pub async fn use_database(&mut self, database: &str) -> DiagResult<()> {
        validate_identifier(database)?;
        self.inner
            .execute(format!("USE [{}]", database), &[])
            .await
            .map_err(DiagError::from)?;
        Ok(())
    }
}

/// Render the `EXEC` statement for a routine call.
fn build_exec_statement(routine: &str, parameters: &RoutineParams) -> DiagResult<String> {
    validate_identifier(routine)?;

    let mut sql = format!("EXEC [{}]", routine);
    let assignments: Vec<String> = parameters
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            validate_parameter_name(name)?;
            Ok(format!("{} = @P{}", name, i + 1))
        })
        .collect::<DiagResult<_>>()?;

    if !assignments.is_empty() {
        sql.push(' ');
        sql.push_str(&assignments.join(", "));
    }
    Ok(sql)
}

/// Routine and database names: identifier characters only.
fn validate_identifier(name: &str) -> DiagResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(DiagError::invalid_input(format!(
            "'{}' is not a valid identifier",
            name
        )))
    }
}

/// Parameter names: `@` followed by identifier characters.
fn validate_parameter_name(name: &str) -> DiagResult<()> {
    let valid = name.len() > 1
        && name.starts_with('@')
        && name[1..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DiagError::invalid_input(format!(
            "'{}' is not a valid parameter name",
            name
        )))
    }
}

/// Bind one routine parameter to the positional placeholder.
fn bind_param(query: &mut Query<'_>, param: &RoutineParam) {
    match param {
        RoutineParam::Null => query.bind(Option::<&str>::None),
        RoutineParam::Bool(v) => query.bind(*v),
        RoutineParam::Int(v) => query.bind(*v),
        RoutineParam::Float(v) => query.bind(*v),
        RoutineParam::Text(v) => query.bind(v.clone()),
        RoutineParam::DateTime(v) => query.bind(*v),
    }
}

/// [`ResultCursor`] adapter over the tiberius `QueryStream`.
///
/// The TDS stream interleaves metadata and row items; metadata marks the
/// start of each result set. Advancing past unread rows on
/// `next_result_set` keeps the wire protocol consistent for skipped and
/// row-capped sets.
pub struct SqlCursor<'a> {
    stream: QueryStream<'a>,
    /// Column names of a result set whose metadata arrived while reading rows.
    pending_columns: Option<Vec<String>>,
}

impl<'a> SqlCursor<'a> {
    pub fn new(stream: QueryStream<'a>) -> Self {
        Self {
            stream,
            pending_columns: None,
        }
    }
}

impl ResultCursor for SqlCursor<'_> {
    async fn next_result_set(&mut self) -> DiagResult<Option<Vec<String>>> {
        if let Some(columns) = self.pending_columns.take() {
            return Ok(Some(columns));
        }

        // Skip leftover rows of the current set until the next metadata item.
        while let Some(item) = self.stream.try_next().await.map_err(DiagError::from)? {
            if let QueryItem::Metadata(meta) = item {
                let columns = meta.columns().iter().map(|c| c.name().to_string()).collect();
                return Ok(Some(columns));
            }
        }
        Ok(None)
    }

    async fn next_row(&mut self) -> DiagResult<Option<Vec<SqlValue>>> {
        if self.pending_columns.is_some() {
            return Ok(None);
        }

        match self.stream.try_next().await.map_err(DiagError::from)? {
            Some(QueryItem::Row(row)) => {
                let cells = row
                    .into_iter()
                    .map(decode_column_data)
                    .collect::<DiagResult<Vec<_>>>()?;
                Ok(Some(cells))
            }
            Some(QueryItem::Metadata(meta)) => {
                // Next result set began; hold its columns for the next advance.
                self.pending_columns =
                    Some(meta.columns().iter().map(|c| c.name().to_string()).collect());
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Decode one TDS cell into the driver-agnostic value type.
fn decode_column_data(data: ColumnData<'static>) -> DiagResult<SqlValue> {
    Ok(match data {
        ColumnData::Bit(v) => v.map(SqlValue::Bool).unwrap_or(SqlValue::Null),
        ColumnData::U8(v) => v
            .map(|x| SqlValue::Int(i64::from(x)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I16(v) => v
            .map(|x| SqlValue::Int(i64::from(x)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I32(v) => v
            .map(|x| SqlValue::Int(i64::from(x)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I64(v) => v.map(SqlValue::Int).unwrap_or(SqlValue::Null),
        ColumnData::F32(v) => v
            .map(|x| SqlValue::Float(f64::from(x)))
            .unwrap_or(SqlValue::Null),
        ColumnData::F64(v) => v.map(SqlValue::Float).unwrap_or(SqlValue::Null),
        ColumnData::Numeric(v) => v
            .map(|n| SqlValue::Decimal(f64::from(n)))
            .unwrap_or(SqlValue::Null),
        ColumnData::String(v) => v
            .map(|s| SqlValue::Text(s.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Guid(v) => v.map(SqlValue::Uuid).unwrap_or(SqlValue::Null),
        ColumnData::Binary(v) => v
            .map(|b| SqlValue::Bytes(b.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Xml(v) => v
            .map(|x| SqlValue::Text(x.into_owned().into_string()))
            .unwrap_or(SqlValue::Null),
        data @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => NaiveDateTime::from_sql(&data)
            .map_err(DiagError::from)?
            .map(SqlValue::DateTime)
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)
            .map_err(DiagError::from)?
            .map(SqlValue::DateTimeOffset)
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::Date(_) => NaiveDate::from_sql(&data)
            .map_err(DiagError::from)?
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::Time(_) => NaiveTime::from_sql(&data)
            .map_err(DiagError::from)?
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::params::set_param;

    #[test]
    fn test_build_exec_without_parameters() {
        let sql = build_exec_statement("sp_Blitz", &RoutineParams::new()).unwrap();
        assert_eq!(sql, "EXEC [sp_Blitz]");
    }

    #[test]
    fn test_build_exec_with_parameters() {
        let mut params = RoutineParams::new();
        set_param(&mut params, "@CheckUserDatabaseObjects", 1);
        set_param(&mut params, "@Top", 10);
        let sql = build_exec_statement("sp_Blitz", &params).unwrap();
        assert_eq!(
            sql,
            "EXEC [sp_Blitz] @CheckUserDatabaseObjects = @P1, @Top = @P2"
        );
    }

    #[test]
    fn test_build_exec_rejects_bad_routine_name() {
        let result = build_exec_statement("sp_Blitz]; DROP TABLE x--", &RoutineParams::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_build_exec_rejects_bad_parameter_name() {
        let mut params = RoutineParams::new();
        set_param(&mut params, "@Top = 1; DROP TABLE x--", 10);
        assert!(build_exec_statement("sp_Blitz", &params).is_err());
    }

    #[test]
    fn test_validate_identifier_allows_qualified_names() {
        assert!(validate_identifier("dbo.sp_WhoIsActive").is_ok());
        assert!(validate_identifier("sp_Blitz").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_specials() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("sp Blitz").is_err());
        assert!(validate_identifier("x]").is_err());
    }

    #[test]
    fn test_validate_parameter_name() {
        assert!(validate_parameter_name("@Top").is_ok());
        assert!(validate_parameter_name("@what_to_check").is_ok());
        assert!(validate_parameter_name("Top").is_err());
        assert!(validate_parameter_name("@").is_err());
        assert!(validate_parameter_name("@a b").is_err());
    }
}
