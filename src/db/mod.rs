//! Database access layer.
//!
//! This module provides the SQL Server specifics behind the gateway:
//! - Per-request TDS connections and the multi-result-set cursor adapter
//! - Routine parameter values and binding helpers
//! - The server registry loaded from configuration
//! - Driver-agnostic scalar values and JSON normalization

pub mod client;
pub mod params;
pub mod registry;
pub mod value;

pub use client::{SqlClient, SqlCursor};
pub use params::{RoutineParam, RoutineParams, add_flag_param, add_param, set_param};
pub use registry::{ServerEntry, ServerRegistry};
pub use value::SqlValue;
