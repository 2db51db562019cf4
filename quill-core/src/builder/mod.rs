//! Clause accumulation and SQL assembly
//!
//! Every assembly function is pure: it reads the accumulated [`Clauses`]
//! and [`Binder`](crate::Binder) state and returns a [`Statement`] without
//! touching the connection.

pub mod common;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use crate::Bindings;

pub use common::{
    Clauses, IntoColumns, IntoRecord, JoinClause, JoinCondition, JoinType, OrderByClause, Record,
    SortDirection,
};
pub use delete::delete_statement;
pub use insert::{bulk_insert_statement, insert_statement, upsert_statement};
pub use select::{render_select, select_statement, union_statement, SetOperator};
pub use update::update_statement;

/// Assembled SQL plus the values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Bindings,
}

impl Statement {
    pub fn new(sql: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}
