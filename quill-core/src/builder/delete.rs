//! DELETE assembly

use super::common::Clauses;
use super::Statement;
use crate::Binder;

/// `DELETE FROM t` plus the accumulated predicates, if any. Whether an
/// unconditional delete is acceptable is the guard's decision, not this
/// function's.
pub fn delete_statement(table: &str, clauses: &Clauses, binder: &Binder) -> Statement {
    let mut sql = format!("DELETE FROM {}", table);
    if clauses.has_predicates() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.predicates.join(" "));
    }
    Statement::new(sql, binder.bindings().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamKind;

    #[test]
    fn test_delete_with_predicates() {
        let mut clauses = Clauses::default();
        let mut binder = Binder::new();
        let p = binder.bind(ParamKind::Predicate, 18);
        clauses.predicates.push(format!("age < {}", p));
        clauses.predicates.push("OR status IS NULL".into());

        let stmt = delete_statement("users", &clauses, &binder);
        assert_eq!(stmt.sql, "DELETE FROM users WHERE age < :w0 OR status IS NULL");
        assert_eq!(stmt.bindings.len(), 1);
    }

    #[test]
    fn test_delete_without_predicates_is_unconditional() {
        let stmt = delete_statement("users", &Clauses::default(), &Binder::new());
        assert_eq!(stmt.sql, "DELETE FROM users");
        assert!(stmt.bindings.is_empty());
    }
}
