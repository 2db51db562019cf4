//! Quill - a fluent SQL session builder with guarded execution
//!
//! A [`QueryBuilder`] is bound to one table at a time. Fluent calls record
//! clauses and parameter values; a terminal call assembles the statement,
//! runs it through the session's guard and executor, and clears the
//! accumulated state.
//!
//! ```no_run
//! use quill::{connect, QuillConfig};
//!
//! # fn main() -> quill::Result<()> {
//! let mut qb = connect(&QuillConfig::from_env())?;
//! let adults = qb
//!     .table("users")
//!     .where_("age", ">", 18)
//!     .order_by("name")
//!     .limit(10, None)
//!     .get()?;
//! # Ok(())
//! # }
//! ```

pub mod config;

// Re-export main types
pub use config::QuillConfig;
pub use quill_core::builder;
pub use quill_core::{
    op, Binder, Bindings, Connection, Error, ExecResult, Fingerprint, Guard, IntoColumns,
    IntoOperator, IntoRecord, JoinType, Model, Operator, ParamKind, PlaceholderStyle,
    QueryBuilder, QueryLogEntry, RawOutcome, Record, Result, ResultSet, Row, SessionConfig,
    SetOperator, SortDirection, SqlxConnection, Statement, Value, ACTION_DELETE, ACTION_DROP,
    SOFT_DELETE_COLUMN, TIMESTAMP_FORMAT,
};

/// Validate `config`, open a connection and start a session with its
/// toggles
pub fn connect(config: &QuillConfig) -> Result<QueryBuilder<SqlxConnection>> {
    config.validate()?;
    let conn = SqlxConnection::connect(&config.database_url)?;
    tracing::info!(
        target: "quill::sql",
        backend = conn.backend_name(),
        safe_mode = config.session.safe_mode,
        cache = config.session.cache,
        "session opened"
    );
    Ok(QueryBuilder::with_config(conn, config.session))
}
