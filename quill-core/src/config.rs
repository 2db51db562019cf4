//! Session toggles

use serde::Deserialize;

/// Behaviour switches of one [`QueryBuilder`](crate::QueryBuilder) session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Block `force_delete` without a WHERE clause
    pub safe_mode: bool,
    /// Serve repeated identical SELECTs from the result cache
    pub cache: bool,
    /// Emit a debug event with SQL and bindings for every statement
    pub debug: bool,
    /// Record executed statements in the query log
    pub log_queries: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            cache: false,
            debug: false,
            log_queries: true,
        }
    }
}
