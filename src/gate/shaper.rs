//! Result shaping: multi-result-set cursor to bounded JSON.
//!
//! The shaper consumes every result set of one routine/query execution in
//! order. The cursor protocol is forward-only: advancing to the next result
//! set discards whatever rows of the current set were not read, which keeps
//! excluded and row-capped sets consistent with the wire protocol.
//!
//! Per result set:
//! 1. zero projected columns: skipped, but the index counter still advances;
//! 2. index in the exclusion set: consumed, not emitted, index advances;
//! 3. otherwise rows are read up to the effective cap, each cell normalized
//!    (`db::value`), excluded columns dropped, text truncated (`format`);
//! 4. `truncated` is set when a row existed beyond the cap;
//! 5. the ordered list of `{truncated, rows}` objects is the final payload.

use crate::db::value::SqlValue;
use crate::error::{DiagError, DiagResult};
use crate::gate::format::{FormatOptions, truncate_if_needed};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::future::Future;

/// Forward-only cursor over the result sets of one execution.
///
/// Implemented by the TDS stream adapter (`db::client`) and by scripted fakes
/// in tests. Advancing with [`ResultCursor::next_result_set`] drains any
/// unread rows of the current set.
pub trait ResultCursor {
    /// Advance to the next result set, returning its projected column names,
    /// or `None` once the cursor is exhausted.
    fn next_result_set(&mut self) -> impl Future<Output = DiagResult<Option<Vec<String>>>> + Send;

    /// Read the next row of the current result set, or `None` at its end.
    fn next_row(&mut self) -> impl Future<Output = DiagResult<Option<Vec<SqlValue>>>> + Send;
}

/// One emitted result set: rows plus a flag marking a hit row cap.
#[derive(Debug, Serialize)]
pub struct ShapedResultSet {
    pub truncated: bool,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
}

/// Shape every result set of `cursor` into the final JSON payload.
pub async fn shape_result_sets<C: ResultCursor>(
    cursor: &mut C,
    options: Option<&FormatOptions>,
    default_max_rows: usize,
) -> DiagResult<String> {
    let max_rows = options
        .and_then(|o| o.max_rows_override)
        .unwrap_or(default_max_rows);

    let mut result_sets: Vec<ShapedResultSet> = Vec::new();
    let mut set_index: usize = 0;

    while let Some(columns) = cursor.next_result_set().await? {
        let index = set_index;
        set_index += 1;

        // Informational passes (PRINT-only) project no columns and do not
        // occupy an output slot.
        if columns.is_empty() {
            continue;
        }

        if options.is_some_and(|o| o.excluded_result_sets.contains(&index)) {
            // Unread rows are drained when the cursor advances.
            continue;
        }

        let mut rows: Vec<serde_json::Map<String, JsonValue>> = Vec::new();
        let mut truncated = false;

        while let Some(cells) = cursor.next_row().await? {
            if rows.len() >= max_rows {
                truncated = true;
                break;
            }

            let mut row = serde_json::Map::new();
            for (name, value) in columns.iter().zip(cells) {
                if options.is_some_and(|o| o.is_column_excluded(name)) {
                    continue;
                }

                let mut normalized = value.normalize();
                if let JsonValue::String(text) = normalized {
                    normalized = JsonValue::String(truncate_if_needed(text, name, options));
                }
                row.insert(name.clone(), normalized);
            }
            rows.push(row);
        }

        result_sets.push(ShapedResultSet { truncated, rows });
    }

    serde_json::to_string(&result_sets)
        .map_err(|e| DiagError::internal(format!("Failed to serialize result sets: {}", e)))
}
