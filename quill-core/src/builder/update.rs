//! UPDATE assembly

use super::common::{Clauses, Record};
use super::Statement;
use crate::{Binder, Error, ParamKind, Result};

/// `UPDATE t SET a = :u0,b = :u1 WHERE ...`
///
/// The SET parameters are bound on a copy of the accumulated binder, so the
/// WHERE clause's values travel in the same binding map.
pub fn update_statement(
    table: &str,
    clauses: &Clauses,
    binder: &Binder,
    record: Record,
) -> Result<Statement> {
    if record.is_empty() {
        return Err(Error::invalid_query("UPDATE requires SET clauses"));
    }

    let mut binder = binder.clone();
    let set_parts: Vec<String> = record
        .into_iter()
        .map(|(column, value)| {
            let param = binder.bind(ParamKind::Update, value);
            format!("{} = {}", column, param)
        })
        .collect();

    let mut sql = format!("UPDATE {} SET {}", table, set_parts.join(","));
    if clauses.has_predicates() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.predicates.join(" "));
    }

    Ok(Statement::new(sql, binder.into_bindings()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::common::IntoRecord;
    use crate::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_merges_predicate_bindings() {
        let mut clauses = Clauses::default();
        let mut binder = Binder::new();
        let p = binder.bind(ParamKind::Predicate, 7);
        clauses.predicates.push(format!("id = {}", p));

        let stmt = update_statement(
            "users",
            &clauses,
            &binder,
            [("name", Value::from("Jane")), ("age", 25.into())].into_record(),
        )
        .unwrap();

        assert_eq!(stmt.sql, "UPDATE users SET name = :u0,age = :u1 WHERE id = :w0");
        assert_eq!(stmt.bindings.get(":w0"), Some(&Value::Int(7)));
        assert_eq!(stmt.bindings.get(":u0"), Some(&Value::from("Jane")));
        assert_eq!(stmt.bindings.len(), 3);
        // the accumulated binder is left untouched
        assert_eq!(binder.bindings().len(), 1);
    }

    #[test]
    fn test_update_without_set_fails() {
        let result = update_statement("users", &Clauses::default(), &Binder::new(), Vec::new());
        assert!(matches!(result, Err(Error::InvalidQuery { .. })));
    }
}
