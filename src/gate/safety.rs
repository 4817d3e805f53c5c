//! Toolkit catalogs: routine allow-lists and parameter block-lists.
//!
//! Each toolkit is described by one immutable [`ToolkitCatalog`] built at
//! startup. Checks are pure functions over that static data plus the per-call
//! input, so a catalog can be shared by any number of concurrent requests.
//! Both checks run before any network I/O: the routine check first, then
//! every supplied parameter name.

use crate::error::{DiagError, DiagResult};
use std::collections::HashSet;

/// Static safety rules for one diagnostic toolkit.
#[derive(Debug, Clone)]
pub struct ToolkitCatalog {
    name: &'static str,
    /// Allowed routine names, stored lowercased for case-insensitive lookup.
    allowed_routines: HashSet<String>,
    /// Blocked parameter names, matched case-insensitively.
    blocked_parameters: Vec<&'static str>,
    blocked_parameter_reason: &'static str,
    not_installed_hint: &'static str,
}

impl ToolkitCatalog {
    pub fn new(
        name: &'static str,
        allowed_routines: &[&str],
        blocked_parameters: &'static [&'static str],
        blocked_parameter_reason: &'static str,
        not_installed_hint: &'static str,
    ) -> Self {
        Self {
            name,
            allowed_routines: allowed_routines
                .iter()
                .map(|r| r.to_ascii_lowercase())
                .collect(),
            blocked_parameters: blocked_parameters.to_vec(),
            blocked_parameter_reason,
            not_installed_hint,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human-readable installation hint for the routine-missing error.
    pub fn not_installed_hint(&self) -> &'static str {
        self.not_installed_hint
    }

    /// Reject routines outside the allow-list (case-insensitive).
    pub fn check_routine(&self, routine: &str) -> DiagResult<()> {
        if self.allowed_routines.contains(&routine.to_ascii_lowercase()) {
            Ok(())
        } else {
            Err(DiagError::unauthorized_routine(routine))
        }
    }

    /// Reject any parameter on the block-list (case-insensitive).
    ///
    /// The first match fails the whole request; blocked parameters are never
    /// silently dropped.
    pub fn check_parameters<'a>(
        &self,
        parameter_names: impl IntoIterator<Item = &'a str>,
    ) -> DiagResult<()> {
        for name in parameter_names {
            if self
                .blocked_parameters
                .iter()
                .any(|blocked| blocked.eq_ignore_ascii_case(name))
            {
                return Err(DiagError::blocked_parameter(
                    name,
                    self.blocked_parameter_reason,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolkitCatalog {
        ToolkitCatalog::new(
            "test-kit",
            &["sp_Allowed", "sp_AlsoAllowed"],
            &["@OutputTableName", "@destination_table"],
            "blocked for testing",
            "install the test kit",
        )
    }

    #[test]
    fn test_allowed_routine_passes() {
        assert!(catalog().check_routine("sp_Allowed").is_ok());
    }

    #[test]
    fn test_allowed_routine_case_insensitive() {
        let catalog = catalog();
        assert!(catalog.check_routine("SP_ALLOWED").is_ok());
        assert!(catalog.check_routine("sp_allowed").is_ok());
        assert!(catalog.check_routine("Sp_AlsoAllowed").is_ok());
    }

    #[test]
    fn test_unknown_routine_rejected() {
        let err = catalog().check_routine("sp_Evil").unwrap_err();
        assert!(matches!(err, DiagError::UnauthorizedRoutine { .. }));
        assert!(err.to_string().contains("sp_Evil"));
    }

    #[test]
    fn test_blocked_parameter_rejected() {
        let err = catalog()
            .check_parameters(["@OutputTableName"])
            .unwrap_err();
        assert!(matches!(err, DiagError::BlockedParameter { .. }));
        let msg = err.to_string();
        assert!(msg.contains("@OutputTableName"));
        assert!(msg.contains("blocked for testing"));
    }

    #[test]
    fn test_blocked_parameter_case_insensitive() {
        let err = catalog()
            .check_parameters(["@OUTPUTTABLENAME"])
            .unwrap_err();
        assert!(matches!(err, DiagError::BlockedParameter { .. }));
    }

    #[test]
    fn test_blocked_parameter_found_among_allowed_ones() {
        let err = catalog()
            .check_parameters(["@Top", "@SortOrder", "@destination_table"])
            .unwrap_err();
        assert!(err.to_string().contains("@destination_table"));
    }

    #[test]
    fn test_clean_parameters_pass() {
        assert!(catalog().check_parameters(["@Top", "@SortOrder"]).is_ok());
        assert!(catalog().check_parameters([]).is_ok());
    }
}
