//! Statement execution: the connection interface, timing, the query log
//! and the result cache.

use crate::builder::Statement;
use crate::{Bindings, ResultSet, Result, SessionConfig, Value};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Blocking database connection.
///
/// Bindings arrive as named (`:name`) or positional (`?`) values; the
/// implementation is responsible for translating them to its driver's
/// placeholder syntax. Transactions are connection-scoped: once `begin`
/// runs, every statement on the connection belongs to the transaction no
/// matter which builder sent it.
pub trait Connection {
    /// Execute a query that returns rows
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet>;

    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE, DDL)
    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet> {
        (**self).fetch_all(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult> {
        (**self).execute(sql, params)
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet> {
        (**self).fetch_all(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult> {
        (**self).execute(sql, params)
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }
}

/// One connection shared by several builders on the same thread. `Rc`
/// keeps the sharing `!Send`.
impl<C: Connection> Connection for Rc<RefCell<C>> {
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet> {
        self.borrow_mut().fetch_all(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult> {
        self.borrow_mut().execute(sql, params)
    }

    fn begin(&mut self) -> Result<()> {
        self.borrow_mut().begin()
    }

    fn commit(&mut self) -> Result<()> {
        self.borrow_mut().commit()
    }

    fn rollback(&mut self) -> Result<()> {
        self.borrow_mut().rollback()
    }
}

/// Result of a raw statement
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    Affected(ExecResult),
    Rows(ResultSet),
}

impl RawOutcome {
    pub fn rows(self) -> Option<ResultSet> {
        match self {
            RawOutcome::Rows(rows) => Some(rows),
            RawOutcome::Affected(_) => None,
        }
    }

    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            RawOutcome::Affected(result) => Some(result.rows_affected),
            RawOutcome::Rows(_) => None,
        }
    }
}

const ROW_KEYWORDS: &[&str] = &[
    "select", "with", "show", "pragma", "explain", "describe", "desc", "values",
];

/// Whether a raw statement is expected to produce rows, judged by its
/// first keyword.
pub fn returns_rows(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    ROW_KEYWORDS.contains(&keyword.as_str())
}

/// One executed statement in the query log
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLogEntry {
    pub sql: String,
    pub elapsed: Duration,
}

/// Cache key: SHA-256 over the SQL text followed by the canonical JSON
/// encoding of its bindings. Floats are encoded by their bit pattern, since
/// JSON has no spelling for NaN or the infinities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(sql: &str, bindings: &Bindings) -> Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        let entries = bindings
            .iter()
            .map(|(name, value)| canonical_value(value).map(|encoded| (name, encoded)))
            .collect::<Result<Vec<_>>>()?;
        hasher.update(serde_json::to_vec(&entries)?);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical_value(value: &Value) -> Result<serde_json::Value> {
    match value {
        Value::Float(f) => Ok(serde_json::json!({
            "FloatBits": format!("{:016x}", f.to_bits())
        })),
        other => Ok(serde_json::to_value(other)?),
    }
}

/// Runs statements against a connection, timing each one.
///
/// The cache never expires or invalidates: after a write to a cached
/// table, an identical SELECT keeps returning the old rows until
/// [`clear_cache`](Executor::clear_cache) runs.
pub struct Executor<C> {
    conn: C,
    log: Vec<QueryLogEntry>,
    cache: HashMap<Fingerprint, ResultSet>,
    cache_enabled: bool,
    debug: bool,
    log_queries: bool,
}

impl<C: Connection> Executor<C> {
    pub fn new(conn: C, config: &SessionConfig) -> Self {
        Self {
            conn,
            log: Vec::new(),
            cache: HashMap::new(),
            cache_enabled: config.cache,
            debug: config.debug,
            log_queries: config.log_queries,
        }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    pub fn set_cache(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn set_log_queries(&mut self, enabled: bool) {
        self.log_queries = enabled;
    }

    pub fn query_log(&self) -> &[QueryLogEntry] {
        &self.log
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached result set. Nothing else ever evicts entries.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Execute through `op`, timing the call. Only successful statements
    /// are logged.
    pub fn run_timed<T, F>(&mut self, stmt: &Statement, op: F) -> Result<T>
    where
        F: FnOnce(&mut C, &str, &Bindings) -> Result<T>,
    {
        let start = Instant::now();
        let outcome = op(&mut self.conn, &stmt.sql, &stmt.bindings)?;
        let elapsed = start.elapsed();

        tracing::trace!(
            target: "quill::sql",
            sql = %stmt.sql,
            elapsed_us = elapsed.as_micros() as u64,
            "statement finished"
        );
        if self.log_queries {
            self.log.push(QueryLogEntry {
                sql: stmt.sql.clone(),
                elapsed,
            });
        }
        if self.debug {
            tracing::debug!(
                target: "quill::sql",
                sql = %stmt.sql,
                bindings = ?stmt.bindings,
                "executed statement"
            );
        }
        Ok(outcome)
    }

    pub fn fetch(&mut self, stmt: &Statement) -> Result<ResultSet> {
        self.run_timed(stmt, |conn, sql, params| conn.fetch_all(sql, params))
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<ExecResult> {
        self.run_timed(stmt, |conn, sql, params| conn.execute(sql, params))
    }

    /// Fetch through the result cache when it is enabled
    pub fn cached_fetch(&mut self, stmt: &Statement) -> Result<ResultSet> {
        if !self.cache_enabled {
            return self.fetch(stmt);
        }

        let key = Fingerprint::compute(&stmt.sql, &stmt.bindings)?;
        if let Some(rows) = self.cache.get(&key) {
            tracing::trace!(target: "quill::sql", fingerprint = key.as_str(), "cache hit");
            return Ok(rows.clone());
        }

        let rows = self.fetch(stmt)?;
        self.cache.insert(key, rows.clone());
        Ok(rows)
    }

    pub fn raw(&mut self, stmt: &Statement) -> Result<RawOutcome> {
        if returns_rows(&stmt.sql) {
            self.fetch(stmt).map(RawOutcome::Rows)
        } else {
            self.execute(stmt).map(RawOutcome::Affected)
        }
    }

    pub fn begin(&mut self) -> Result<()> {
        tracing::debug!(target: "quill::sql", "BEGIN");
        self.conn.begin()
    }

    pub fn commit(&mut self) -> Result<()> {
        tracing::debug!(target: "quill::sql", "COMMIT");
        self.conn.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        tracing::debug!(target: "quill::sql", "ROLLBACK");
        self.conn.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockConnection;
    use crate::Row;

    fn select(sql: &str, bindings: Bindings) -> Statement {
        Statement::new(sql, bindings)
    }

    #[test]
    fn test_fingerprint_is_stable_and_value_sensitive() {
        let a = Fingerprint::compute("SELECT * FROM t WHERE id = :w0", &Bindings::named([("w0", 1)])).unwrap();
        let b = Fingerprint::compute("SELECT * FROM t WHERE id = :w0", &Bindings::named([("w0", 1)])).unwrap();
        let c = Fingerprint::compute("SELECT * FROM t WHERE id = :w0", &Bindings::named([("w0", 2)])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_keeps_non_finite_floats_apart() {
        let sql = "SELECT * FROM t WHERE x < :w0";
        let key = |f: f64| Fingerprint::compute(sql, &Bindings::named([("w0", f)])).unwrap();
        assert_ne!(key(f64::NAN), key(f64::INFINITY));
        assert_ne!(key(f64::INFINITY), key(f64::NEG_INFINITY));
        assert_ne!(key(f64::NAN), key(f64::NEG_INFINITY));
        assert_ne!(key(1.5), key(2.5));
        assert_eq!(key(1.5), key(1.5));
    }

    #[test]
    fn test_run_timed_appends_log() {
        let mut executor = Executor::new(MockConnection::new(), &SessionConfig::default());
        executor.execute(&select("DELETE FROM t", Bindings::new())).unwrap();
        assert_eq!(executor.query_log().len(), 1);
        assert_eq!(executor.query_log()[0].sql, "DELETE FROM t");
    }

    #[test]
    fn test_logging_can_be_disabled() {
        let config = SessionConfig {
            log_queries: false,
            ..SessionConfig::default()
        };
        let mut executor = Executor::new(MockConnection::new(), &config);
        executor.execute(&select("DELETE FROM t", Bindings::new())).unwrap();
        assert!(executor.query_log().is_empty());
    }

    #[test]
    fn test_failed_statement_is_not_logged() {
        let mut executor = Executor::new(MockConnection::failing(), &SessionConfig::default());
        assert!(executor.fetch(&select("SELECT 1", Bindings::new())).is_err());
        assert!(executor.query_log().is_empty());
    }

    #[test]
    fn test_cache_hit_skips_connection() {
        let config = SessionConfig {
            cache: true,
            ..SessionConfig::default()
        };
        let rows = vec![[("id", Value::Int(1))].into_iter().collect::<Row>()];
        let mut executor = Executor::new(MockConnection::with_rows(rows.clone()), &config);
        let stmt = select("SELECT * FROM t WHERE id = :w0", Bindings::named([("w0", 1)]));

        assert_eq!(executor.cached_fetch(&stmt).unwrap(), rows);
        assert_eq!(executor.cached_fetch(&stmt).unwrap(), rows);
        assert_eq!(executor.connection().calls().len(), 1);
        assert_eq!(executor.query_log().len(), 1);
        assert_eq!(executor.cache_len(), 1);
    }

    #[test]
    fn test_cache_disabled_always_executes() {
        let mut executor = Executor::new(MockConnection::new(), &SessionConfig::default());
        let stmt = select("SELECT * FROM t", Bindings::new());
        executor.cached_fetch(&stmt).unwrap();
        executor.cached_fetch(&stmt).unwrap();
        assert_eq!(executor.connection().calls().len(), 2);
        assert_eq!(executor.cache_len(), 0);
    }

    #[test]
    fn test_returns_rows_classification() {
        assert!(returns_rows("  select 1"));
        assert!(returns_rows("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_rows("SHOW TABLES"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!returns_rows("DROP TABLE x"));
        assert!(!returns_rows("INSERT INTO t VALUES (1)"));
        assert!(!returns_rows("deleted_rows"));
    }

    #[test]
    fn test_raw_routes_by_keyword() {
        let mut executor = Executor::new(MockConnection::new(), &SessionConfig::default());
        let outcome = executor.raw(&select("SELECT 1", Bindings::new())).unwrap();
        assert!(matches!(outcome, RawOutcome::Rows(_)));
        let outcome = executor.raw(&select("TRUNCATE t", Bindings::new())).unwrap();
        assert_eq!(outcome.rows_affected(), Some(1));
    }

    #[test]
    fn test_shared_connection_sees_one_transaction() {
        let shared = Rc::new(RefCell::new(MockConnection::new()));
        let mut first = Executor::new(Rc::clone(&shared), &SessionConfig::default());
        let mut second = Executor::new(Rc::clone(&shared), &SessionConfig::default());

        first.begin().unwrap();
        second.execute(&select("DELETE FROM t WHERE id = 1", Bindings::new())).unwrap();
        first.commit().unwrap();

        let calls = shared.borrow().calls().to_vec();
        assert_eq!(calls, vec!["BEGIN", "DELETE FROM t WHERE id = 1", "COMMIT"]);
    }
}
