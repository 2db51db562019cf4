//! INSERT, bulk INSERT and UPSERT assembly

use super::common::Record;
use super::Statement;
use crate::{Binder, Error, ParamKind, Result};

fn require_columns(record: &Record, verb: &str) -> Result<()> {
    if record.is_empty() {
        return Err(Error::invalid_query(format!(
            "{} requires columns and values",
            verb
        )));
    }
    Ok(())
}

fn column_list(record: &Record) -> String {
    record
        .iter()
        .map(|(column, _)| column.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// `INSERT INTO t (a,b) VALUES (:i0,:i1)` with its own fresh bindings
pub fn insert_statement(table: &str, record: Record) -> Result<Statement> {
    require_columns(&record, "INSERT")?;

    let columns = column_list(&record);
    let mut binder = Binder::new();
    let placeholders: Vec<String> = record
        .into_iter()
        .map(|(_, value)| binder.bind(ParamKind::Insert, value))
        .collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns,
        placeholders.join(",")
    );
    Ok(Statement::new(sql, binder.into_bindings()))
}

/// One multi-row INSERT. The first row fixes the column list; every row
/// must provide each of those columns. Returns `None` for no rows.
pub fn bulk_insert_statement(table: &str, rows: Vec<Record>) -> Result<Option<Statement>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    require_columns(first, "INSERT")?;

    let header: Vec<String> = first.iter().map(|(column, _)| column.clone()).collect();
    let mut binder = Binder::new();
    let mut groups = Vec::with_capacity(rows.len());

    for (row_index, mut row) in rows.into_iter().enumerate() {
        if row.len() != header.len() {
            return Err(Error::invalid_query(format!(
                "bulk INSERT row {} has {} columns, expected {}",
                row_index,
                row.len(),
                header.len()
            )));
        }

        let mut placeholders = Vec::with_capacity(header.len());
        for (column_index, column) in header.iter().enumerate() {
            let position = row.iter().position(|(name, _)| name == column).ok_or_else(|| {
                Error::invalid_query(format!(
                    "bulk INSERT row {} is missing column '{}'",
                    row_index, column
                ))
            })?;
            let (_, value) = row.swap_remove(position);
            placeholders.push(binder.bind_cell(row_index, column_index, value));
        }
        groups.push(format!("({})", placeholders.join(",")));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        header.join(","),
        groups.join(",")
    );
    Ok(Some(Statement::new(sql, binder.into_bindings())))
}

/// INSERT that overwrites every inserted column on a duplicate key
pub fn upsert_statement(table: &str, record: Record) -> Result<Statement> {
    require_columns(&record, "UPSERT")?;

    let columns = column_list(&record);
    let updates: Vec<String> = record
        .iter()
        .map(|(column, _)| format!("{} = VALUES({})", column, column))
        .collect();

    let mut binder = Binder::new();
    let placeholders: Vec<String> = record
        .into_iter()
        .map(|(_, value)| binder.bind(ParamKind::Upsert, value))
        .collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
        table,
        columns,
        placeholders.join(","),
        updates.join(",")
    );
    Ok(Statement::new(sql, binder.into_bindings()))
}
