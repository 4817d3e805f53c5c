//! Routine parameter values and map-building helpers.
//!
//! Stored procedure parameters are collected as `(name, value)` pairs in call
//! order. The helpers here mirror how the diagnostic procedures expect their
//! arguments: optional inputs are omitted entirely when absent, and boolean
//! flags are sent as 1/0 integers (the procedures declare them as BIT or
//! TINYINT and accept either).

use chrono::NaiveDateTime;

/// A value bound to a stored procedure parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutineParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl From<bool> for RoutineParam {
    fn from(v: bool) -> Self {
        RoutineParam::Bool(v)
    }
}

impl From<i32> for RoutineParam {
    fn from(v: i32) -> Self {
        RoutineParam::Int(i64::from(v))
    }
}

impl From<i64> for RoutineParam {
    fn from(v: i64) -> Self {
        RoutineParam::Int(v)
    }
}

impl From<f64> for RoutineParam {
    fn from(v: f64) -> Self {
        RoutineParam::Float(v)
    }
}

impl From<String> for RoutineParam {
    fn from(v: String) -> Self {
        RoutineParam::Text(v)
    }
}

impl From<&str> for RoutineParam {
    fn from(v: &str) -> Self {
        RoutineParam::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for RoutineParam {
    fn from(v: NaiveDateTime) -> Self {
        RoutineParam::DateTime(v)
    }
}

/// Ordered list of named routine parameters.
pub type RoutineParams = Vec<(String, RoutineParam)>;

/// Add a parameter when the value is present; absent values are not sent.
pub fn add_param(params: &mut RoutineParams, name: &str, value: Option<impl Into<RoutineParam>>) {
    if let Some(value) = value {
        params.push((name.to_string(), value.into()));
    }
}

/// Add a boolean flag parameter as 1/0 when present.
pub fn add_flag_param(params: &mut RoutineParams, name: &str, value: Option<bool>) {
    if let Some(value) = value {
        params.push((name.to_string(), RoutineParam::Int(i64::from(value))));
    }
}

/// Add a parameter unconditionally.
pub fn set_param(params: &mut RoutineParams, name: &str, value: impl Into<RoutineParam>) {
    params.push((name.to_string(), value.into()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_flag_param_true_maps_to_1() {
        let mut params = RoutineParams::new();
        add_flag_param(&mut params, "@Flag", Some(true));
        assert_eq!(params, vec![("@Flag".to_string(), RoutineParam::Int(1))]);
    }

    #[test]
    fn test_add_flag_param_false_maps_to_0() {
        let mut params = RoutineParams::new();
        add_flag_param(&mut params, "@Flag", Some(false));
        assert_eq!(params, vec![("@Flag".to_string(), RoutineParam::Int(0))]);
    }

    #[test]
    fn test_add_flag_param_none_adds_nothing() {
        let mut params = RoutineParams::new();
        add_flag_param(&mut params, "@Flag", None);
        assert!(params.is_empty());
    }

    #[test]
    fn test_add_param_with_value() {
        let mut params = RoutineParams::new();
        add_param(&mut params, "@Top", Some(10));
        assert_eq!(params, vec![("@Top".to_string(), RoutineParam::Int(10))]);
    }

    #[test]
    fn test_add_param_none_adds_nothing() {
        let mut params = RoutineParams::new();
        add_param(&mut params, "@Top", None::<i32>);
        assert!(params.is_empty());
    }

    #[test]
    fn test_string_conversion() {
        let mut params = RoutineParams::new();
        add_param(&mut params, "@SortOrder", Some("cpu".to_string()));
        assert_eq!(
            params,
            vec![(
                "@SortOrder".to_string(),
                RoutineParam::Text("cpu".to_string())
            )]
        );
    }
}
