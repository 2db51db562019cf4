//! Quill Core - a fluent SQL session builder with guarded execution
//!
//! This crate accumulates clauses and bound values on a [`QueryBuilder`],
//! assembles them into parameterized SQL, checks destructive statements
//! against safe mode and role permissions, and runs them on a blocking
//! [`Connection`] with timing, a query log and an optional result cache.

pub mod binder;
pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod guard;
pub mod operator;
pub mod row;
pub mod session;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use binder::{Binder, Bindings, ParamKind, PlaceholderStyle};
pub use builder::{
    IntoColumns, IntoRecord, JoinType, Record, SetOperator, SortDirection, Statement,
};
pub use config::SessionConfig;
pub use driver::SqlxConnection;
pub use error::{Error, Result};
pub use executor::{Connection, ExecResult, Fingerprint, QueryLogEntry, RawOutcome};
pub use guard::{Guard, ACTION_DELETE, ACTION_DROP};
pub use operator::{op, IntoOperator, Operator};
pub use row::{ResultSet, Row};
pub use session::{Model, QueryBuilder, SOFT_DELETE_COLUMN};
pub use value::{Value, TIMESTAMP_FORMAT};
