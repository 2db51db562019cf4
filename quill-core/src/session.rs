//! The fluent session object tying clauses, guard and executor together

use crate::builder::{
    bulk_insert_statement, delete_statement, insert_statement, render_select, select_statement,
    union_statement, update_statement, upsert_statement, Clauses, IntoColumns, IntoRecord,
    JoinClause, JoinCondition, JoinType, OrderByClause, SetOperator, SortDirection, Statement,
};
use crate::executor::{Executor, QueryLogEntry, RawOutcome};
use crate::{
    op, Binder, Bindings, Connection, Error, Guard, IntoOperator, ParamKind, ResultSet, Result,
    Row, SessionConfig, Value,
};
use serde::de::DeserializeOwned;

/// Column written by [`QueryBuilder::soft_delete`] and checked by
/// [`QueryBuilder::without_trashed`]
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

/// A single-owner query session bound to one table at a time.
///
/// Fluent calls accumulate clauses and bound values. A terminal call
/// (`get`, `insert`, `update`, `delete`, ...) assembles one statement,
/// runs it and clears the accumulated state while keeping the table, so
/// the next chain starts fresh against the same table:
///
/// ```ignore
/// let rows = qb
///     .table("users")
///     .where_("age", ">", 18)
///     .order_by("name")
///     .limit(10, None)
///     .get()?;
/// ```
///
/// Predicates are joined with a single space in call order. Only
/// `or_where` and `and_where` add a connective, so chaining two plain
/// `where_` calls produces invalid SQL. `OR` is never parenthesized.
pub struct QueryBuilder<C> {
    executor: Executor<C>,
    guard: Guard,
    table: Option<String>,
    clauses: Clauses,
    binder: Binder,
}

impl<C: Connection> QueryBuilder<C> {
    /// Start a session with the default toggles (safe mode on, cache off, query log on)
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, SessionConfig::default())
    }

    /// Start a session with explicit toggles
    pub fn with_config(conn: C, config: SessionConfig) -> Self {
        let mut guard = Guard::new();
        guard.set_safe_mode(config.safe_mode);
        Self {
            executor: Executor::new(conn, &config),
            guard,
            table: None,
            clauses: Clauses::default(),
            binder: Binder::new(),
        }
    }

    // Table and projection

    /// Bind the session to `name`, discarding every accumulated clause
    /// and binding
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = Some(name.into());
        self.reset();
        self
    }

    /// Replace the projection with one expression or a list of columns
    pub fn select<T: IntoColumns>(&mut self, columns: T) -> &mut Self {
        self.clauses.projection = columns.into_columns().join(", ");
        self
    }

    /// Prefix the current projection with `DISTINCT`
    pub fn distinct(&mut self) -> &mut Self {
        self.clauses.projection = format!("DISTINCT {}", self.clauses.projection);
        self
    }

    /// Append an expression to the projection, e.g. a CASE or aggregate
    pub fn select_append(&mut self, expression: &str) -> &mut Self {
        self.clauses.projection = format!("{}, {}", self.clauses.projection, expression);
        self
    }

    // Predicates

    /// Add `column <op> :wN`. No connective is added
    pub fn where_<O, V>(&mut self, column: &str, operator: O, value: V) -> &mut Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        self.push_comparison("", column, operator, value)
    }

    /// Add `AND column <op> :wN`
    pub fn and_where<O, V>(&mut self, column: &str, operator: O, value: V) -> &mut Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        self.push_comparison("AND ", column, operator, value)
    }

    /// Add `OR column <op> :wN`, without parentheses
    pub fn or_where<O, V>(&mut self, column: &str, operator: O, value: V) -> &mut Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        self.push_comparison("OR ", column, operator, value)
    }

    fn push_comparison<O, V>(&mut self, connective: &str, column: &str, operator: O, value: V) -> &mut Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        let param = self.binder.bind(ParamKind::Predicate, value);
        self.clauses.predicates.push(format!(
            "{}{} {} {}",
            connective,
            column,
            operator.into_operator(),
            param
        ));
        self
    }

    /// `column IN (...)` with one parameter per value. An empty list
    /// renders `IN ()`, which most databases reject.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<String> = values
            .into_iter()
            .map(|value| self.binder.bind(ParamKind::Predicate, value))
            .collect();
        self.clauses
            .predicates
            .push(format!("{} IN ({})", column, params.join(",")));
        self
    }

    /// Add `column BETWEEN :wN AND :wM`
    pub fn where_between<A, B>(&mut self, column: &str, min: A, max: B) -> &mut Self
    where
        A: Into<Value>,
        B: Into<Value>,
    {
        let low = self.binder.bind(ParamKind::Predicate, min);
        let high = self.binder.bind(ParamKind::Predicate, max);
        self.clauses
            .predicates
            .push(format!("{} BETWEEN {} AND {}", column, low, high));
        self
    }

    /// Add `column IS NULL`
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.clauses.predicates.push(format!("{} IS NULL", column));
        self
    }

    /// Add `column IS NOT NULL`
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.clauses.predicates.push(format!("{} IS NOT NULL", column));
        self
    }

    /// Compare against a sub-query. The SQL is inserted verbatim and must
    /// not carry untrusted input.
    pub fn where_sub<O: IntoOperator>(&mut self, column: &str, operator: O, subquery: &str) -> &mut Self {
        self.clauses.predicates.push(format!(
            "{} {} ({})",
            column,
            operator.into_operator(),
            subquery
        ));
        self
    }

    /// Skip soft-deleted rows
    pub fn without_trashed(&mut self) -> &mut Self {
        let connective = if self.clauses.has_predicates() { "AND " } else { "" };
        self.clauses
            .predicates
            .push(format!("{}{} IS NULL", connective, SOFT_DELETE_COLUMN));
        self
    }

    // Joins

    /// Add a join. Cross joins ignore the ON parts
    pub fn join<O: IntoOperator>(
        &mut self,
        join_type: JoinType,
        table: &str,
        left: &str,
        operator: O,
        right: &str,
    ) -> &mut Self {
        let on = match join_type {
            JoinType::Cross => None,
            _ => Some(JoinCondition {
                left: left.to_string(),
                operator: operator.into_operator(),
                right: right.to_string(),
            }),
        };
        self.clauses.joins.push(JoinClause {
            join_type,
            table: table.to_string(),
            on,
        });
        self
    }

    /// Add `INNER JOIN table ON left <op> right`
    pub fn inner_join<O: IntoOperator>(&mut self, table: &str, left: &str, operator: O, right: &str) -> &mut Self {
        self.join(JoinType::Inner, table, left, operator, right)
    }

    /// Add `LEFT JOIN table ON left <op> right`
    pub fn left_join<O: IntoOperator>(&mut self, table: &str, left: &str, operator: O, right: &str) -> &mut Self {
        self.join(JoinType::Left, table, left, operator, right)
    }

    /// Add `RIGHT JOIN table ON left <op> right`
    pub fn right_join<O: IntoOperator>(&mut self, table: &str, left: &str, operator: O, right: &str) -> &mut Self {
        self.join(JoinType::Right, table, left, operator, right)
    }

    /// Add `CROSS JOIN table`
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join(JoinType::Cross, table, "", op::EQ, "")
    }

    // Grouping, ordering, paging

    /// Append grouping columns after any already given
    pub fn group_by<T: IntoColumns>(&mut self, columns: T) -> &mut Self {
        self.clauses.group_by.extend(columns.into_columns());
        self
    }

    /// Raw HAVING condition; several are ANDed
    pub fn having(&mut self, condition: &str) -> &mut Self {
        self.clauses.having.push(condition.to_string());
        self
    }

    /// Order by `column` with the database's default (ascending) direction
    pub fn order_by(&mut self, column: &str) -> &mut Self {
        self.push_order(column, None)
    }

    /// Append an ascending sort key
    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.push_order(column, Some(SortDirection::Asc))
    }

    /// Append a descending sort key
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.push_order(column, Some(SortDirection::Desc))
    }

    /// Append a sort key with an explicit direction
    pub fn order_by_direction(&mut self, column: &str, direction: SortDirection) -> &mut Self {
        self.push_order(column, Some(direction))
    }

    fn push_order(&mut self, column: &str, direction: Option<SortDirection>) -> &mut Self {
        self.clauses.order_by.push(OrderByClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Set the row limit. The offset is only replaced when one is given,
    /// so an earlier offset survives a later `limit(n, None)`.
    pub fn limit(&mut self, count: u64, offset: impl Into<Option<u64>>) -> &mut Self {
        self.clauses.set_limit(count, offset.into());
        self
    }

    // Terminal operations

    /// Run the accumulated SELECT, through the result cache when it is on
    pub fn get(&mut self) -> Result<ResultSet> {
        let stmt = select_statement(self.bound_table()?, &self.clauses, &self.binder);
        self.finish(|executor| executor.cached_fetch(&stmt))
    }

    /// Run [`get`](Self::get) and deserialize every row into `T`
    pub fn get_as<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.get()?.iter().map(Row::deserialize).collect()
    }

    /// Run the SELECT with `LIMIT 1`, keeping any earlier offset
    pub fn first(&mut self) -> Result<Option<Row>> {
        self.bound_table()?;
        self.clauses.set_limit(1, None);
        Ok(self.get()?.into_iter().next())
    }

    /// `COUNT(*)` over the accumulated predicates. The projection is
    /// replaced and the query runs through `first`.
    pub fn count(&mut self) -> Result<i64> {
        self.bound_table()?;
        self.select("COUNT(*) as total");
        let total = self
            .first()?
            .and_then(|row| row.get("total").and_then(Value::as_i64))
            .unwrap_or(0);
        Ok(total)
    }

    /// Whether [`count`](Self::count) is above zero
    pub fn exists(&mut self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// Insert one row and return the generated id, when the driver
    /// reports one
    pub fn insert<R: IntoRecord>(&mut self, data: R) -> Result<Option<i64>> {
        let stmt = insert_statement(self.bound_table()?, data.into_record())?;
        let done = self.finish(|executor| executor.execute(&stmt))?;
        Ok(done.last_insert_id)
    }

    /// Insert many rows in one statement. No rows means no statement.
    pub fn insert_bulk<I, R>(&mut self, rows: I) -> Result<u64>
    where
        I: IntoIterator<Item = R>,
        R: IntoRecord,
    {
        let records = rows.into_iter().map(IntoRecord::into_record).collect();
        let Some(stmt) = bulk_insert_statement(self.bound_table()?, records)? else {
            return Ok(0);
        };
        let done = self.finish(|executor| executor.execute(&stmt))?;
        Ok(done.rows_affected)
    }

    /// UPDATE the rows matching the accumulated predicates; returns the affected count
    pub fn update<R: IntoRecord>(&mut self, data: R) -> Result<u64> {
        let stmt = update_statement(
            self.bound_table()?,
            &self.clauses,
            &self.binder,
            data.into_record(),
        )?;
        let done = self.finish(|executor| executor.execute(&stmt))?;
        Ok(done.rows_affected)
    }

    /// DELETE without the safe-mode check; see [`force_delete`](Self::force_delete)
    pub fn delete(&mut self) -> Result<u64> {
        let stmt = delete_statement(self.bound_table()?, &self.clauses, &self.binder);
        let done = self.finish(|executor| executor.execute(&stmt))?;
        Ok(done.rows_affected)
    }

    /// DELETE that safe mode refuses to run without a WHERE clause
    pub fn force_delete(&mut self) -> Result<u64> {
        self.bound_table()?;
        self.guard.check_delete(self.clauses.has_predicates())?;
        self.delete()
    }

    /// Insert, or overwrite every given column when the key already exists
    pub fn upsert<R: IntoRecord>(&mut self, data: R) -> Result<u64> {
        let stmt = upsert_statement(self.bound_table()?, data.into_record())?;
        let done = self.finish(|executor| executor.execute(&stmt))?;
        Ok(done.rows_affected)
    }

    /// Stamp the matching rows as deleted instead of removing them
    pub fn soft_delete(&mut self) -> Result<u64> {
        let now = chrono::Local::now().naive_local();
        self.update([(SOFT_DELETE_COLUMN, Value::Timestamp(now))])
    }

    /// `(<accumulated select>) UNION (<second>)`; `second` is inserted
    /// verbatim
    pub fn union(&mut self, second: &str) -> Result<ResultSet> {
        self.set_operation(SetOperator::Union, second)
    }

    /// `(<accumulated select>) UNION ALL (<second>)`; `second` is inserted verbatim
    pub fn union_all(&mut self, second: &str) -> Result<ResultSet> {
        self.set_operation(SetOperator::UnionAll, second)
    }

    fn set_operation(&mut self, operator: SetOperator, second: &str) -> Result<ResultSet> {
        let stmt = union_statement(self.bound_table()?, &self.clauses, &self.binder, operator, second);
        self.finish(|executor| executor.fetch(&stmt))
    }

    // Raw statements

    /// Run SQL as written, with no guard checks and without touching the
    /// accumulated clauses. Statements starting with a row-returning
    /// keyword come back as [`RawOutcome::Rows`].
    pub fn raw_execute(&mut self, sql: &str, params: &Bindings) -> Result<RawOutcome> {
        self.executor.raw(&Statement::new(sql, params.clone()))
    }

    /// [`raw_execute`](Self::raw_execute) after the role check for `drop`
    /// and `delete`
    pub fn secure_raw(&mut self, sql: &str, params: &Bindings) -> Result<RawOutcome> {
        self.guard.check_raw(sql)?;
        self.raw_execute(sql, params)
    }

    // Transactions

    /// Send BEGIN on the connection
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.executor.begin()
    }

    /// Send COMMIT on the connection
    pub fn commit(&mut self) -> Result<()> {
        self.executor.commit()
    }

    /// Send ROLLBACK on the connection
    pub fn rollback(&mut self) -> Result<()> {
        self.executor.rollback()
    }

    /// Run `work` inside BEGIN/COMMIT, rolling back when it fails
    pub fn transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin_transaction()?;
        match work(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(
                        target: "quill::sql",
                        error = %rollback_err,
                        "rollback after failed transaction also failed"
                    );
                }
                Err(err)
            }
        }
    }

    // Session toggles

    /// Make `force_delete` refuse statements without a WHERE clause
    pub fn enable_safe_mode(&mut self) -> &mut Self {
        self.guard.set_safe_mode(true);
        self
    }

    /// Let `force_delete` run without a WHERE clause
    pub fn disable_safe_mode(&mut self) -> &mut Self {
        self.guard.set_safe_mode(false);
        self
    }

    /// Whether safe mode is on
    pub fn safe_mode(&self) -> bool {
        self.guard.safe_mode()
    }

    /// Serve repeated identical SELECTs from the result cache
    pub fn enable_cache(&mut self) -> &mut Self {
        self.executor.set_cache(true);
        self
    }

    /// Stop consulting the cache; stored entries are kept
    pub fn disable_cache(&mut self) -> &mut Self {
        self.executor.set_cache(false);
        self
    }

    /// Drop every cached result set
    pub fn clear_cache(&mut self) {
        self.executor.clear_cache();
    }

    /// Number of cached result sets
    pub fn cache_len(&self) -> usize {
        self.executor.cache_len()
    }

    /// Emit a debug event with SQL and bindings for every statement
    pub fn enable_debug(&mut self) -> &mut Self {
        self.executor.set_debug(true);
        self
    }

    /// Stop the per-statement debug events
    pub fn disable_debug(&mut self) -> &mut Self {
        self.executor.set_debug(false);
        self
    }

    /// Record executed statements in the query log
    pub fn enable_query_log(&mut self) -> &mut Self {
        self.executor.set_log_queries(true);
        self
    }

    /// Stop recording executed statements
    pub fn disable_query_log(&mut self) -> &mut Self {
        self.executor.set_log_queries(false);
        self
    }

    /// Every statement this session has run, oldest first
    pub fn query_log(&self) -> &[QueryLogEntry] {
        self.executor.query_log()
    }

    // Roles

    /// Register or replace the actions a role may perform in `secure_raw`
    pub fn define_role<I, A>(&mut self, role: impl Into<String>, actions: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.guard.define_role(role, actions);
        self
    }

    /// Make `role` the current role for `secure_raw` checks
    pub fn set_role(&mut self, role: impl Into<String>) -> &mut Self {
        self.guard.set_role(role);
        self
    }

    /// Drop the current role; everything is permitted again
    pub fn clear_role(&mut self) -> &mut Self {
        self.guard.clear_role();
        self
    }

    /// The current role, if any
    pub fn current_role(&self) -> Option<&str> {
        self.guard.current_role()
    }

    // Inspection

    /// Table the session is bound to
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Clauses accumulated since the last reset
    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    /// Values bound since the last reset
    pub fn bindings(&self) -> &Bindings {
        self.binder.bindings()
    }

    /// SELECT text for the current state, without running it
    pub fn to_sql(&self) -> Result<String> {
        Ok(render_select(self.bound_table()?, &self.clauses))
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &C {
        self.executor.connection()
    }

    /// Mutably borrow the underlying connection
    pub fn connection_mut(&mut self) -> &mut C {
        self.executor.connection_mut()
    }

    /// Consume the session and return its connection
    pub fn into_connection(self) -> C {
        self.executor.into_connection()
    }

    /// Table-scoped shortcuts. Each call rebinds this session to `table`.
    pub fn model(&mut self, table: impl Into<String>) -> Model<'_, C> {
        Model {
            session: self,
            table: table.into(),
        }
    }

    fn bound_table(&self) -> Result<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| Error::invalid_query("no table selected; call table() first"))
    }

    fn reset(&mut self) {
        self.clauses.reset();
        self.binder.clear();
    }

    /// Hand the statement to the executor, then reset whatever happens
    fn finish<T, F>(&mut self, run: F) -> Result<T>
    where
        F: FnOnce(&mut Executor<C>) -> Result<T>,
    {
        let outcome = run(&mut self.executor);
        self.reset();
        outcome
    }
}

/// A table name bound to a session, with the usual CRUD shortcuts
pub struct Model<'a, C> {
    session: &'a mut QueryBuilder<C>,
    table: String,
}

impl<'a, C: Connection> Model<'a, C> {
    /// Table this model reads and writes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every row of the table
    pub fn all(&mut self) -> Result<ResultSet> {
        self.session.table(self.table.as_str()).get()
    }

    /// The row whose `id` equals `id`, if any
    pub fn find(&mut self, id: impl Into<Value>) -> Result<Option<Row>> {
        self.session
            .table(self.table.as_str())
            .where_("id", op::EQ, id)
            .first()
    }

    /// Insert one row; returns the generated id
    pub fn create<R: IntoRecord>(&mut self, data: R) -> Result<Option<i64>> {
        self.session.table(self.table.as_str()).insert(data)
    }

    /// Delete the row whose `id` equals `id`
    pub fn delete(&mut self, id: impl Into<Value>) -> Result<u64> {
        self.session
            .table(self.table.as_str())
            .where_("id", op::EQ, id)
            .delete()
    }
}
