//! In-memory connection used by the unit tests

use crate::{Bindings, Connection, Error, ExecResult, ResultSet, Result};

#[derive(Debug, Clone)]
pub struct MockConnection {
    calls: Vec<String>,
    bindings: Vec<Bindings>,
    rows: ResultSet,
    result: ExecResult,
    fail: bool,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            bindings: Vec::new(),
            rows: Vec::new(),
            result: ExecResult {
                rows_affected: 1,
                last_insert_id: Some(1),
            },
            fail: false,
        }
    }

    pub fn with_rows(rows: ResultSet) -> Self {
        Self {
            rows,
            ..Self::new()
        }
    }

    pub fn with_result(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            result: ExecResult {
                rows_affected,
                last_insert_id,
            },
            ..Self::new()
        }
    }

    /// Every fetch and execute fails with a driver error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn last_sql(&self) -> Option<&str> {
        self.calls.last().map(String::as_str)
    }

    pub fn last_bindings(&self) -> Option<&Bindings> {
        self.bindings.last()
    }

    fn record(&mut self, sql: &str, params: &Bindings) -> Result<()> {
        self.calls.push(sql.to_string());
        self.bindings.push(params.clone());
        if self.fail {
            return Err(Error::Driver(sqlx::Error::Protocol("mock failure".into())));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet> {
        self.record(sql, params)?;
        Ok(self.rows.clone())
    }

    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult> {
        self.record(sql, params)?;
        Ok(self.result)
    }

    fn begin(&mut self) -> Result<()> {
        self.calls.push("BEGIN".into());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.calls.push("COMMIT".into());
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.calls.push("ROLLBACK".into());
        Ok(())
    }
}
