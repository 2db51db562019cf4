//! SELECT and UNION assembly

use super::common::Clauses;
use super::Statement;
use crate::Binder;
use std::fmt;

/// Render the SELECT for the accumulated clauses.
///
/// Clause order is fixed: projection, FROM, joins, WHERE, GROUP BY,
/// HAVING, ORDER BY, LIMIT. Predicate fragments are joined with a single
/// space; any `AND` between them has to be part of the fragment itself,
/// only `or_where` adds its own `OR`. With both a limit and an offset the
/// comma form `LIMIT <offset>,<limit>` is produced.
pub fn render_select(table: &str, clauses: &Clauses) -> String {
    let mut sql = String::new();

    sql.push_str("SELECT ");
    sql.push_str(&clauses.projection);
    sql.push_str(" FROM ");
    sql.push_str(table);

    if !clauses.joins.is_empty() {
        let joins: Vec<String> = clauses.joins.iter().map(|j| j.to_string()).collect();
        sql.push(' ');
        sql.push_str(&joins.join(" "));
    }

    if !clauses.predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.predicates.join(" "));
    }

    if !clauses.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&clauses.group_by.join(", "));
    }

    if !clauses.having.is_empty() {
        sql.push_str(" HAVING ");
        sql.push_str(&clauses.having.join(" AND "));
    }

    if !clauses.order_by.is_empty() {
        let order: Vec<String> = clauses.order_by.iter().map(|o| o.to_string()).collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }

    if let Some(limit) = clauses.limit {
        match clauses.offset {
            Some(offset) => sql.push_str(&format!(" LIMIT {},{}", offset, limit)),
            None => sql.push_str(&format!(" LIMIT {}", limit)),
        }
    }

    sql
}

pub fn select_statement(table: &str, clauses: &Clauses, binder: &Binder) -> Statement {
    Statement::new(render_select(table, clauses), binder.bindings().clone())
}

/// Set operator joining two SELECTs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperator::Union => write!(f, "UNION"),
            SetOperator::UnionAll => write!(f, "UNION ALL"),
        }
    }
}

/// Wrap the accumulated SELECT and `second` in parentheses joined by the
/// set operator.
///
/// `second` is inserted as-is: it is neither parameterized nor escaped, so
/// it must never contain untrusted input.
pub fn union_statement(
    table: &str,
    clauses: &Clauses,
    binder: &Binder,
    operator: SetOperator,
    second: &str,
) -> Statement {
    let first = render_select(table, clauses);
    let sql = format!("({}) {} ({})", first, operator, second);
    Statement::new(sql, binder.bindings().clone())
}
