//! Result formatting options and string truncation.
//!
//! Every toolkit builds a [`FormatOptions`] value from a handful of caller
//! flags (see `toolkits/`); the result shaper applies it per cell. Column
//! matching is case-insensitive throughout. A column listed in both the
//! exclusion set and the truncation map is excluded - exclusion wins because
//! the shaper never materializes excluded cells.

use std::collections::{HashMap, HashSet};

/// Global ceiling applied to text values when no override is in play.
pub const GLOBAL_MAX_STRING_LENGTH: usize = 8000;

/// Marker appended to truncated text values.
pub const TRUNCATION_SUFFIX: &str = "...[truncated]";

/// Per-invocation shaping rules for one routine execution.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Columns dropped from every row (case-insensitive, stored lowercased).
    pub excluded_columns: HashSet<String>,
    /// Per-column truncation lengths (case-insensitive, stored lowercased).
    pub truncated_columns: HashMap<String, usize>,
    /// Zero-based indices of result sets to consume but not emit.
    pub excluded_result_sets: HashSet<usize>,
    /// Row cap override; the configured server default applies when absent.
    pub max_rows_override: Option<usize>,
    /// Caller-level string cap; `usize::MAX` means never truncate.
    pub max_string_length: Option<usize>,
}

impl FormatOptions {
    /// Options with truncation disabled entirely (the `verbose` escape hatch).
    pub fn unbounded() -> Self {
        Self {
            max_string_length: Some(usize::MAX),
            ..Self::default()
        }
    }

    pub fn is_column_excluded(&self, column: &str) -> bool {
        self.excluded_columns.contains(&column.to_ascii_lowercase())
    }

    pub fn column_limit(&self, column: &str) -> Option<usize> {
        self.truncated_columns
            .get(&column.to_ascii_lowercase())
            .copied()
    }
}

/// Build a case-insensitive column set from literal names.
pub fn column_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_ascii_lowercase()).collect()
}

/// Build a case-insensitive column -> max length map from literal entries.
pub fn column_limits(entries: &[(&str, usize)]) -> HashMap<String, usize> {
    entries
        .iter()
        .map(|(n, len)| (n.to_ascii_lowercase(), *len))
        .collect()
}

/// Truncate a text value according to the resolved limit.
///
/// Limit precedence: per-column entry, then the caller's global override,
/// then [`GLOBAL_MAX_STRING_LENGTH`]. The per-column entry wins even when the
/// caller's override is larger - toolkits use it to keep high-volume columns
/// (plan XML, query text) bounded independent of the caller's verbosity
/// choice. A value whose length equals the limit is left untouched.
pub fn truncate_if_needed(text: String, column: &str, options: Option<&FormatOptions>) -> String {
    let limit = options
        .and_then(|o| o.column_limit(column))
        .or_else(|| options.and_then(|o| o.max_string_length))
        .unwrap_or(GLOBAL_MAX_STRING_LENGTH);

    if limit == usize::MAX {
        return text;
    }

    let mut chars = text.char_indices();
    match chars.nth(limit) {
        // More than `limit` chars: keep the first `limit` and mark the cut.
        Some((byte_idx, _)) => {
            let mut truncated = String::with_capacity(byte_idx + TRUNCATION_SUFFIX.len());
            truncated.push_str(&text[..byte_idx]);
            truncated.push_str(TRUNCATION_SUFFIX);
            truncated
        }
        None => text,
    }
}
