//! Driver-agnostic scalar values and JSON normalization.
//!
//! The TDS driver decodes each cell into a [`SqlValue`]; [`SqlValue::normalize`]
//! turns it into a JSON-safe value for the result shaper.
//!
//! Normalization rules:
//! - Date/time values without a zone render as ISO-8601 round-trip strings
//!   with a 7-digit fractional second (`2024-06-15T14:30:00.0000000`); no
//!   zone conversion ever happens.
//! - Date/time values with an offset keep their original numeric offset.
//! - Binary renders as standard Base64; an empty binary value renders as the
//!   empty string, not `null`.
//! - Every other scalar (integer, float, decimal, boolean, text, uniqueidentifier)
//!   passes through without stringification.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A single cell value as decoded from the database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// DECIMAL/NUMERIC, carried as f64 after driver conversion
    Decimal(f64),
    Text(String),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// datetime / smalldatetime / datetime2 - no zone information
    DateTime(NaiveDateTime),
    /// datetimeoffset - zone offset preserved
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    /// Convert into a JSON-safe value.
    pub fn normalize(self) -> JsonValue {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(v) => JsonValue::Bool(v),
            SqlValue::Int(v) => JsonValue::from(v),
            SqlValue::Float(v) | SqlValue::Decimal(v) => serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Text(s) => JsonValue::String(s),
            SqlValue::Uuid(u) => JsonValue::String(u.to_string()),
            SqlValue::Bytes(b) => JsonValue::String(STANDARD.encode(&b)),
            SqlValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            SqlValue::Time(t) => JsonValue::String(format!(
                "{}.{:07}",
                t.format("%H:%M:%S"),
                ticks_of(t.nanosecond())
            )),
            SqlValue::DateTime(dt) => JsonValue::String(format_round_trip(&dt)),
            SqlValue::DateTimeOffset(dto) => JsonValue::String(format_round_trip_offset(&dto)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// Fractional seconds as 100ns ticks (7 digits, the TDS datetime2 precision).
fn ticks_of(nanos: u32) -> u32 {
    nanos / 100
}

/// ISO-8601 round-trip format for zoneless date/times.
fn format_round_trip(dt: &NaiveDateTime) -> String {
    format!(
        "{}.{:07}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        ticks_of(dt.nanosecond())
    )
}

/// ISO-8601 round-trip format keeping the original numeric offset.
fn format_round_trip_offset(dt: &DateTime<FixedOffset>) -> String {
    format!(
        "{}.{:07}{}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        ticks_of(dt.nanosecond()),
        dt.format("%:z")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_renders_round_trip_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(
            SqlValue::DateTime(dt).normalize(),
            JsonValue::String("2024-06-15T14:30:00.0000000".to_string())
        );
    }

    #[test]
    fn test_datetime_keeps_subsecond_ticks() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_nano_opt(14, 30, 0, 123_456_700)
            .unwrap();
        assert_eq!(
            SqlValue::DateTime(dt).normalize(),
            JsonValue::String("2024-06-15T14:30:00.1234567".to_string())
        );
    }

    #[test]
    fn test_datetimeoffset_preserves_offset() {
        let dto = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 31, 23, 59, 59)
            .unwrap();
        assert_eq!(
            SqlValue::DateTimeOffset(dto).normalize(),
            JsonValue::String("2024-12-31T23:59:59.0000000+00:00".to_string())
        );
    }

    #[test]
    fn test_datetimeoffset_nonzero_offset() {
        let dto = FixedOffset::east_opt(5 * 3600 + 30 * 60)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap();
        assert_eq!(
            SqlValue::DateTimeOffset(dto).normalize(),
            JsonValue::String("2024-01-02T03:04:05.0000000+05:30".to_string())
        );
    }

    #[test]
    fn test_bytes_render_as_base64() {
        assert_eq!(
            SqlValue::Bytes(vec![1, 2, 3]).normalize(),
            JsonValue::String("AQID".to_string())
        );
    }

    #[test]
    fn test_empty_bytes_render_as_empty_string() {
        assert_eq!(
            SqlValue::Bytes(Vec::new()).normalize(),
            JsonValue::String(String::new())
        );
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(SqlValue::Int(42).normalize(), JsonValue::from(42));
        assert_eq!(SqlValue::Bool(true).normalize(), JsonValue::Bool(true));
        assert_eq!(SqlValue::Float(1.5).normalize(), JsonValue::from(1.5));
        assert_eq!(
            SqlValue::Text("hello".to_string()).normalize(),
            JsonValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_decimal_stays_numeric() {
        let normalized = SqlValue::Decimal(12.34).normalize();
        assert!(normalized.is_number());
    }

    #[test]
    fn test_uuid_renders_lowercase_hyphenated() {
        let uuid = Uuid::parse_str("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(
            SqlValue::Uuid(uuid).normalize(),
            JsonValue::String("6f9619ff-8b86-d011-b42d-00c04fc964ff".to_string())
        );
    }

    #[test]
    fn test_nan_float_becomes_null() {
        assert_eq!(SqlValue::Float(f64::NAN).normalize(), JsonValue::Null);
    }

    #[test]
    fn test_null_stays_null() {
        assert!(SqlValue::Null.is_null());
        assert_eq!(SqlValue::Null.normalize(), JsonValue::Null);
    }

    #[test]
    fn test_date_renders_plain_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            SqlValue::Date(d).normalize(),
            JsonValue::String("2024-03-09".to_string())
        );
    }
}
