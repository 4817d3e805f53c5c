//! Server registry: named connection descriptors loaded once at startup.

use crate::error::{DiagError, DiagResult};
use std::collections::HashMap;

/// A configured SQL Server instance.
#[derive(Debug, Clone)]
pub struct ServerEntry {
    name: String,
    /// Full ADO.NET-style connection string (sensitive - not logged).
    connection_string: String,
}

impl ServerEntry {
    pub fn new(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection_string: connection_string.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

/// Immutable name -> connection descriptor lookup.
///
/// Built once from configuration; lookups are exact and case-sensitive. A
/// miss reports every configured name so the caller can self-correct.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: HashMap<String, ServerEntry>,
}

impl ServerRegistry {
    pub fn new(entries: impl IntoIterator<Item = ServerEntry>) -> Self {
        Self {
            servers: entries
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
        }
    }

    /// Resolve a server by exact name.
    pub fn resolve(&self, name: &str) -> DiagResult<&ServerEntry> {
        self.servers
            .get(name)
            .ok_or_else(|| DiagError::unknown_server(name, &self.server_names()))
    }

    /// All configured server names, sorted.
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ServerRegistry {
        ServerRegistry::new([
            ServerEntry::new("prod", "Server=tcp:prod,1433;User Id=sa;Password=x;"),
            ServerEntry::new("dev", "Server=tcp:dev,1433;User Id=sa;Password=x;"),
        ])
    }

    #[test]
    fn test_resolve_known_server() {
        let registry = registry();
        let entry = registry.resolve("prod").unwrap();
        assert_eq!(entry.name(), "prod");
        assert!(entry.connection_string().contains("tcp:prod"));
    }

    #[test]
    fn test_resolve_unknown_server_lists_names_sorted() {
        let registry = registry();
        let err = registry.resolve("staging").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Server 'staging' not found"));
        assert!(msg.contains("dev, prod"));
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let registry = registry();
        assert!(registry.resolve("PROD").is_err());
    }

    #[test]
    fn test_server_names_sorted() {
        assert_eq!(registry().server_names(), vec!["dev", "prod"]);
    }
}
