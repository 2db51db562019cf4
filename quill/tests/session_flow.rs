use pretty_assertions::assert_eq;
use quill::{
    op, Bindings, Connection, Error, ExecResult, QueryBuilder, RawOutcome, Result, ResultSet, Row,
    SessionConfig, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Records every statement and answers SELECTs with canned rows
#[derive(Default)]
struct RecordingConnection {
    statements: Vec<(String, Bindings)>,
    rows: ResultSet,
    next_id: i64,
}

impl Connection for RecordingConnection {
    fn fetch_all(&mut self, sql: &str, params: &Bindings) -> Result<ResultSet> {
        self.statements.push((sql.to_string(), params.clone()));
        Ok(self.rows.clone())
    }

    fn execute(&mut self, sql: &str, params: &Bindings) -> Result<ExecResult> {
        self.statements.push((sql.to_string(), params.clone()));
        self.next_id += 1;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(self.next_id),
        })
    }

    fn begin(&mut self) -> Result<()> {
        self.statements.push(("BEGIN".into(), Bindings::new()));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.statements.push(("COMMIT".into(), Bindings::new()));
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.statements.push(("ROLLBACK".into(), Bindings::new()));
        Ok(())
    }
}

fn sql_log(conn: &RecordingConnection) -> Vec<&str> {
    conn.statements.iter().map(|(sql, _)| sql.as_str()).collect()
}

#[test]
fn test_crud_flow_over_borrowed_connection() {
    let mut conn = RecordingConnection::default();
    {
        let mut qb = QueryBuilder::new(&mut conn);

        let id = qb
            .table("users")
            .insert([("name", Value::from("Ann")), ("age", Value::from(31))])
            .unwrap();
        assert_eq!(id, Some(1));

        qb.where_("id", op::EQ, 1).update([("age", 32)]).unwrap();
        qb.select(("id", "name"))
            .where_("age", ">", 30)
            .or_where("name", op::LIKE, "A%")
            .order_by_asc("name")
            .limit(20, 40)
            .get()
            .unwrap();
        qb.where_("id", "=", 1).force_delete().unwrap();
    }

    assert_eq!(
        sql_log(&conn),
        vec![
            "INSERT INTO users (name,age) VALUES (:i0,:i1)",
            "UPDATE users SET age = :u0 WHERE id = :w0",
            "SELECT id, name FROM users WHERE age > :w0 OR name LIKE :w1 ORDER BY name ASC LIMIT 40,20",
            "DELETE FROM users WHERE id = :w0",
        ]
    );
    assert_eq!(conn.statements[2].1.get(":w1"), Some(&Value::from("A%")));
}

#[test]
fn test_guard_refusals_are_distinguishable() {
    let mut qb = QueryBuilder::new(RecordingConnection::default());
    let blocked = qb.table("logs").force_delete().unwrap_err();
    assert!(blocked.is_guard());

    qb.define_role("analyst", Vec::<String>::new()).set_role("analyst");
    let denied = qb
        .secure_raw("DELETE FROM logs WHERE id = 1", &Bindings::new())
        .unwrap_err();
    assert!(matches!(denied, Error::PermissionDenied { ref action, .. } if action == "delete"));

    qb.clear_role();
    let outcome = qb
        .secure_raw("DELETE FROM logs WHERE id = 1", &Bindings::new())
        .unwrap();
    assert_eq!(outcome, RawOutcome::Affected(ExecResult { rows_affected: 1, last_insert_id: Some(1) }));
}

#[test]
fn test_cached_session_against_shared_connection() {
    let row: Row = [("id", Value::Int(1))].into_iter().collect();
    let shared = Rc::new(RefCell::new(RecordingConnection {
        rows: vec![row],
        ..RecordingConnection::default()
    }));

    let config = SessionConfig {
        cache: true,
        ..SessionConfig::default()
    };
    let mut reader = QueryBuilder::with_config(Rc::clone(&shared), config);
    let mut writer = QueryBuilder::new(Rc::clone(&shared));

    let before = reader.table("users").where_("id", "=", 1).get().unwrap();
    writer.table("users").where_("id", "=", 1).update([("name", "Bo")]).unwrap();
    let after = reader.table("users").where_("id", "=", 1).get().unwrap();

    // the reader's cache is never invalidated by writes
    assert_eq!(before, after);
    assert_eq!(shared.borrow().statements.len(), 2);
    assert_eq!(reader.query_log().len(), 1);
    assert_eq!(writer.query_log().len(), 1);
}

#[test]
fn test_transaction_and_model() {
    let mut qb = QueryBuilder::new(RecordingConnection::default());
    qb.transaction(|qb| {
        let mut posts = qb.model("posts");
        posts.create([("title", "hello")])?;
        posts.delete(9)?;
        Ok(())
    })
    .unwrap();

    let raw = qb
        .raw_execute("SELECT * FROM posts WHERE id = ?", &Bindings::positional([1]))
        .unwrap();
    assert!(raw.rows().is_some());

    assert_eq!(
        sql_log(qb.connection()),
        vec![
            "BEGIN",
            "INSERT INTO posts (title) VALUES (:i0)",
            "DELETE FROM posts WHERE id = :w0",
            "COMMIT",
            "SELECT * FROM posts WHERE id = ?",
        ]
    );
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_end_to_end() {
    let config = quill::QuillConfig::default();
    let mut qb = quill::connect(&config).unwrap();

    qb.raw_execute(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER, deleted_at TEXT)",
        &Bindings::new(),
    )
    .unwrap();
    qb.table("users")
        .insert_bulk(vec![
            [("name", Value::from("Ann")), ("age", Value::from(31))],
            [("name", Value::from("Bob")), ("age", Value::from(17))],
        ])
        .unwrap();

    assert_eq!(qb.where_("age", ">", 18).count().unwrap(), 1);

    qb.where_("name", "=", "Bob").soft_delete().unwrap();
    let live = qb.without_trashed().get().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].get("name"), Some(&Value::from("Ann")));
}
