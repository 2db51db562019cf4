fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "sqlite")]
    {
        use quill::{op, Bindings, QuillConfig, RawOutcome, Value};

        println!("=== Quill SQLite - Usage Example ===\n");

        let config = QuillConfig {
            database_url: "sqlite::memory:".to_string(),
            ..QuillConfig::from_env()
        };
        let mut qb = quill::connect(&config)?;

        qb.raw_execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER, deleted_at TEXT)",
            &Bindings::new(),
        )?;

        // Bulk INSERT: one statement, every row bound separately
        let inserted = qb.table("users").insert_bulk(vec![
            [("name", Value::from("John")), ("age", Value::from(30))],
            [("name", Value::from("Jane")), ("age", Value::from(25))],
            [("name", Value::from("Tim")), ("age", Value::from(15))],
        ])?;
        println!("1. Inserted {} rows", inserted);

        // SELECT; `and_where`/`or_where` supply the connective
        let adults = qb
            .where_("age", op::GTE, 18)
            .and_where("name", op::LIKE, "J%")
            .order_by_desc("age")
            .limit(10, None)
            .get()?;
        println!("2. Adults:");
        for row in &adults {
            println!("   {}", row.to_json());
        }

        println!("3. Count under 18: {}", qb.where_("age", "<", 18).count()?);

        // Soft delete then read only live rows
        qb.where_("name", "=", "Tim").soft_delete()?;
        let live = qb.without_trashed().get()?;
        println!("4. Live rows after soft delete: {}", live.len());

        // Safe mode refuses DELETE without WHERE
        if let Err(err) = qb.force_delete() {
            println!("5. Refused: {}", err);
        }

        // Roles only gate raw statements
        qb.define_role("reader", Vec::<String>::new()).set_role("reader");
        if let Err(err) = qb.secure_raw("DROP TABLE users", &Bindings::new()) {
            println!("6. Refused: {}", err);
        }
        qb.clear_role();

        qb.transaction(|qb| {
            qb.table("users").where_("id", "=", 1).update([("age", 31)])?;
            Ok(())
        })?;

        if let RawOutcome::Rows(rows) =
            qb.raw_execute("SELECT name, age FROM users WHERE id = ?", &Bindings::positional([1]))?
        {
            if let Some(row) = rows.first() {
                println!("7. After transaction: {}", row.to_json());
            }
        }

        println!("\nExecuted statements:");
        for entry in qb.query_log() {
            println!("   {:>8.3?}  {}", entry.elapsed, entry.sql);
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        println!("Run with --features sqlite to execute this example");
    }

    Ok(())
}
