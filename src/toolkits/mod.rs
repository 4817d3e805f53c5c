//! Diagnostic toolkits.
//!
//! Each toolkit pairs a static safety catalog (routine allow-list, parameter
//! block-list, rejection strings) with thin handlers that map MCP tool inputs
//! to routine parameters and format options, then call the execution gateway.
//! The gateway itself is generic; everything toolkit-specific lives here as
//! data.

pub mod darling_data;
pub mod first_responder;
pub mod who_is_active;

pub use darling_data::DarlingDataToolkit;
pub use first_responder::FirstResponderToolkit;
pub use who_is_active::WhoIsActiveToolkit;
