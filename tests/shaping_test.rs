//! Integration tests for result shaping with real toolkit format options.
//!
//! The scripted cursor stands in for the TDS stream; the options come from
//! the actual toolkit factories, so these tests cover the full path a routine
//! result takes: factory -> shaper -> normalizer -> truncation -> JSON.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde_json::Value as JsonValue;
use sqldiag_mcp_server::db::value::SqlValue;
use sqldiag_mcp_server::error::DiagResult;
use sqldiag_mcp_server::gate::format::FormatOptions;
use sqldiag_mcp_server::gate::{ResultCursor, shape_result_sets};
use sqldiag_mcp_server::toolkits::{first_responder, who_is_active};
use std::collections::VecDeque;

/// In-memory cursor over pre-built result sets. Advancing discards unread
/// rows of the current set, like the real TDS stream adapter.
struct ScriptedCursor {
    sets: VecDeque<(Vec<String>, VecDeque<Vec<SqlValue>>)>,
    current: Option<VecDeque<Vec<SqlValue>>>,
}

impl ScriptedCursor {
    fn new(sets: Vec<(Vec<&str>, Vec<Vec<SqlValue>>)>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .map(|(cols, rows)| {
                    (
                        cols.into_iter().map(String::from).collect(),
                        rows.into_iter().collect(),
                    )
                })
                .collect(),
            current: None,
        }
    }
}

impl ResultCursor for ScriptedCursor {
    async fn next_result_set(&mut self) -> DiagResult<Option<Vec<String>>> {
        match self.sets.pop_front() {
            Some((columns, rows)) => {
                self.current = Some(rows);
                Ok(Some(columns))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    async fn next_row(&mut self) -> DiagResult<Option<Vec<SqlValue>>> {
        Ok(self.current.as_mut().and_then(|rows| rows.pop_front()))
    }
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

async fn shape(
    sets: Vec<(Vec<&str>, Vec<Vec<SqlValue>>)>,
    options: Option<&FormatOptions>,
    max_rows: usize,
) -> JsonValue {
    let mut cursor = ScriptedCursor::new(sets);
    let json = shape_result_sets(&mut cursor, options, max_rows)
        .await
        .unwrap();
    serde_json::from_str(&json).unwrap()
}

/// sp_Blitz default options drop the plan columns and truncate Details.
#[tokio::test]
async fn test_blitz_output_shaped_by_factory_defaults() {
    let options = first_responder::build_blitz_options(None, None);
    let long_details = "d".repeat(3000);

    let payload = shape(
        vec![(
            vec!["Priority", "Finding", "Details", "QueryPlan"],
            vec![vec![
                SqlValue::Int(50),
                text("Slow storage"),
                text(&long_details),
                text("<plan/>"),
            ]],
        )],
        Some(&options),
        1000,
    )
    .await;

    let row = payload[0]["rows"][0].as_object().unwrap();
    assert_eq!(row["Priority"], 50);
    assert!(!row.contains_key("QueryPlan"));

    let details = row["Details"].as_str().unwrap();
    assert_eq!(details.len(), 2000 + "...[truncated]".len());
    assert!(details.ends_with("...[truncated]"));
}

/// Verbose disables both exclusion and truncation entirely.
#[tokio::test]
async fn test_blitz_verbose_keeps_everything() {
    let options = first_responder::build_blitz_options(None, Some(true));
    let long_details = "d".repeat(20_000);

    let payload = shape(
        vec![(
            vec!["Details", "QueryPlan"],
            vec![vec![text(&long_details), text("<plan/>")]],
        )],
        Some(&options),
        1000,
    )
    .await;

    let row = payload[0]["rows"][0].as_object().unwrap();
    assert_eq!(row["Details"].as_str().unwrap().len(), 20_000);
    assert_eq!(row["QueryPlan"], "<plan/>");
}

/// WhoIsActive default options use per-column limits that beat nothing else,
/// while compact mode applies a 500-char global cap to every text column.
#[tokio::test]
async fn test_who_is_active_compact_caps_all_text() {
    let options = who_is_active::build_who_is_active_options(Some(true), None);
    let long_text = "s".repeat(800);

    let payload = shape(
        vec![(
            vec!["session_id", "sql_text", "wait_info"],
            vec![vec![SqlValue::Int(51), text(&long_text), text(&long_text)]],
        )],
        Some(&options),
        1000,
    )
    .await;

    let row = payload[0]["rows"][0].as_object().unwrap();
    assert_eq!(
        row["sql_text"].as_str().unwrap().len(),
        500 + "...[truncated]".len()
    );
    assert_eq!(
        row["wait_info"].as_str().unwrap().len(),
        500 + "...[truncated]".len()
    );
    assert_eq!(row["session_id"], 51);
}

/// Multi-result-set routine output: every set appears in order, row caps are
/// per set, and normalized values survive the trip.
#[tokio::test]
async fn test_multi_result_set_routine_payload() {
    let started = NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    let logged = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 12, 31, 23, 59, 59)
        .unwrap();

    let payload = shape(
        vec![
            (
                vec!["session_id", "start_time", "logged_at", "plan_handle", "note"],
                vec![vec![
                    SqlValue::Int(64),
                    SqlValue::DateTime(started),
                    SqlValue::DateTimeOffset(logged),
                    SqlValue::Bytes(vec![0x06, 0x00, 0x01]),
                    SqlValue::Null,
                ]],
            ),
            (
                vec!["wait_type", "wait_time_ms"],
                vec![
                    vec![text("PAGEIOLATCH_SH"), SqlValue::Int(1200)],
                    vec![text("CXPACKET"), SqlValue::Int(400)],
                    vec![text("SOS_SCHEDULER_YIELD"), SqlValue::Int(90)],
                ],
            ),
        ],
        None,
        2,
    )
    .await;

    let sets = payload.as_array().unwrap();
    assert_eq!(sets.len(), 2);

    let first = sets[0]["rows"][0].as_object().unwrap();
    assert_eq!(first["start_time"], "2024-06-15T14:30:00.0000000");
    assert_eq!(first["logged_at"], "2024-12-31T23:59:59.0000000+00:00");
    assert_eq!(first["plan_handle"], "BgAB");
    assert!(first["note"].is_null());
    assert_eq!(sets[0]["truncated"], false);

    // Second set has three rows but a cap of two.
    assert_eq!(sets[1]["truncated"], true);
    assert_eq!(sets[1]["rows"].as_array().unwrap().len(), 2);
}

/// Empty binary values come back as "" rather than null.
#[tokio::test]
async fn test_empty_binary_is_empty_string_in_payload() {
    let payload = shape(
        vec![(vec!["blob"], vec![vec![SqlValue::Bytes(Vec::new())]])],
        None,
        1000,
    )
    .await;
    assert_eq!(payload[0]["rows"][0]["blob"], "");
}

/// Row objects keep the projected column order.
#[tokio::test]
async fn test_row_objects_preserve_column_order() {
    let payload = shape(
        vec![(
            vec!["zeta", "alpha", "midpoint"],
            vec![vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]],
        )],
        None,
        1000,
    )
    .await;

    let keys: Vec<&String> = payload[0]["rows"][0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["zeta", "alpha", "midpoint"]);
}

/// A caller max_string_length of usize::MAX disables truncation regardless of
/// value length, even with no per-column entries.
#[tokio::test]
async fn test_unbounded_string_length_never_truncates() {
    let options = FormatOptions::unbounded();
    let huge = "x".repeat(100_000);
    let payload = shape(
        vec![(vec!["col"], vec![vec![text(&huge)]])],
        Some(&options),
        1000,
    )
    .await;
    assert_eq!(payload[0]["rows"][0]["col"].as_str().unwrap().len(), 100_000);
}
