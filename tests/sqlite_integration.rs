use retrograde::prelude::*;
use rusqlite::Connection as Db;

use chrono::{NaiveDateTime, Utc};

/// Test-local SQLite connection; the feature-gated store in the crate
/// mirrors this shape.
struct TestConnection {
    conn: Db,
}

impl TestConnection {
    fn new() -> Self {
        Self {
            conn: Db::open_in_memory().unwrap(),
        }
    }

    fn table_exists(&self, name: &str) -> bool {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |_| Ok(true),
            )
            .unwrap_or(false)
    }

    fn index_exists(&self, name: &str) -> bool {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1",
                [name],
                |_| Ok(true),
            )
            .unwrap_or(false)
    }

    fn count_tables(&self, name: &str) -> i64 {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap()
    }
}

impl Connection for TestConnection {
    fn execute(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.conn
            .execute(sql, [])
            .map_err(|e| MigrateError::Database(e.to_string()))?;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| MigrateError::Database(e.to_string()))
    }

    fn begin(&mut self) -> Result<(), MigrateError> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), MigrateError> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), MigrateError> {
        self.execute_batch("ROLLBACK")
    }
}

impl HistoryStore for TestConnection {
    fn probe(&mut self) -> Result<(), HistoryError> {
        match self.conn.prepare("SELECT id FROM migrations LIMIT 1") {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("no such table") => Err(HistoryError::MissingTable),
            Err(e) => Err(HistoryError::Backend(e.to_string())),
        }
    }

    fn applied(&mut self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, applied_at FROM migrations ORDER BY id")
            .map_err(|e| HistoryError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let applied_at: String = row.get(1)?;
                Ok((name, applied_at))
            })
            .map_err(|e| HistoryError::Backend(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HistoryError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(identifier, applied_at)| HistoryEntry {
                identifier,
                applied_at: NaiveDateTime::parse_from_str(&applied_at, "%Y-%m-%d %H:%M:%S")
                    .map(|dt| dt.and_utc())
                    .unwrap_or_else(|_| Utc::now()),
            })
            .collect())
    }

    fn record(&mut self, identifier: &str) -> Result<(), HistoryError> {
        self.conn
            .execute("INSERT INTO migrations (name) VALUES (?1)", [identifier])
            .map_err(|e| HistoryError::Backend(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, identifier: &str) -> Result<(), HistoryError> {
        self.conn
            .execute("DELETE FROM migrations WHERE name = ?1", [identifier])
            .map_err(|e| HistoryError::Backend(e.to_string()))?;
        Ok(())
    }
}

fn blog_migrations() -> MigrationSet {
    let mut set = MigrationSet::new();

    set.register(
        Migration::symmetric("0001_create_users")
            .create_table(
                "users",
                vec![
                    Column::new("email", ColumnType::Text).not_null().unique(),
                    Column::new("created_at", ColumnType::Datetime)
                        .not_null()
                        .default("CURRENT_TIMESTAMP"),
                ],
            )
            .add_index("users", "idx_users_email", &["email"], "unique"),
    );

    set.register(Migration::symmetric("0002_create_posts").create_table(
        "posts",
        vec![
            Column::new("author_id", ColumnType::Integer).not_null(),
            Column::new("title", ColumnType::String).limit(200).not_null(),
        ],
    ));

    set
}

#[test]
fn migrate_bootstraps_history_and_applies_everything() {
    let set = blog_migrations();
    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();

    let outcomes = runner.migrate(&mut conn, Step::All).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| matches!(o, Outcome::Success(_))));

    assert!(conn.table_exists("migrations"));
    assert!(conn.table_exists("users"));
    assert!(conn.table_exists("posts"));
    assert!(conn.index_exists("idx_users_email"));
}

#[test]
fn bootstrap_is_idempotent_across_runs() {
    let set = blog_migrations();
    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();

    runner.migrate(&mut conn, Step::Limit(1)).unwrap();
    runner.migrate(&mut conn, Step::All).unwrap();
    runner.migrate(&mut conn, Step::All).unwrap();

    assert_eq!(conn.count_tables("migrations"), 1);
}

#[test]
fn rollback_restores_the_prior_schema() {
    let set = blog_migrations();
    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();

    runner.migrate(&mut conn, Step::All).unwrap();
    let outcomes = runner.rollback(&mut conn, Step::All).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| matches!(o, Outcome::Success(_))));

    assert!(!conn.table_exists("users"));
    assert!(!conn.table_exists("posts"));
    assert!(!conn.index_exists("idx_users_email"));
    assert!(conn.applied().unwrap().is_empty());
}

#[test]
fn step_limited_rollback_reverts_only_the_newest() {
    let set = blog_migrations();
    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();

    runner.migrate(&mut conn, Step::All).unwrap();
    runner.rollback(&mut conn, Step::Limit(1)).unwrap();

    assert!(conn.table_exists("users"));
    assert!(!conn.table_exists("posts"));
    let ids: Vec<String> = conn
        .applied()
        .unwrap()
        .into_iter()
        .map(|e| e.identifier)
        .collect();
    assert_eq!(ids, vec!["0001_create_users"]);
}

#[test]
fn irreversible_migration_reverts_nothing() {
    let mut set = MigrationSet::new();
    set.register(
        Migration::symmetric("0001_setup")
            .create_table("keep", vec![Column::new("v", ColumnType::Integer)]),
    );
    set.register(Migration::symmetric("0002_cleanup").drop_table("keep"));

    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();
    runner.migrate(&mut conn, Step::All).unwrap();

    let outcomes = runner.rollback(&mut conn, Step::All).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Outcome::Failure(_)));

    // history still records both migrations; nothing was undone
    let ids: Vec<String> = conn
        .applied()
        .unwrap()
        .into_iter()
        .map(|e| e.identifier)
        .collect();
    assert_eq!(ids, vec!["0001_setup", "0002_cleanup"]);
}

#[test]
fn failed_migration_leaves_no_partial_schema() {
    let mut set = MigrationSet::new();
    set.register(
        Migration::symmetric("0001_pair")
            .create_table("alpha", vec![Column::new("v", ColumnType::Integer)])
            // duplicate table name makes the second statement fail mid-unit
            .create_table("alpha", vec![Column::new("v", ColumnType::Integer)]),
    );

    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();
    let outcomes = runner.migrate(&mut conn, Step::All).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Outcome::Failure(_)));
    assert!(!conn.table_exists("alpha"));
    assert!(conn.applied().unwrap().is_empty());
}

#[test]
fn rename_round_trip_is_lossless() {
    let mut set = MigrationSet::new();
    set.register(
        Migration::symmetric("0001_tables")
            .create_table("drafts", vec![Column::new("body", ColumnType::Text)]),
    );
    set.register(Migration::symmetric("0002_rename").rename_table("drafts", "articles"));

    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();

    runner.migrate(&mut conn, Step::All).unwrap();
    assert!(conn.table_exists("articles"));
    assert!(!conn.table_exists("drafts"));

    runner.rollback(&mut conn, Step::Limit(1)).unwrap();
    assert!(conn.table_exists("drafts"));
    assert!(!conn.table_exists("articles"));
}

#[test]
fn bad_index_kind_fails_validation() {
    let mut set = MigrationSet::new();
    set.register(
        Migration::symmetric("0001_bad")
            .create_table("users", vec![Column::new("email", ColumnType::Text)])
            .add_index("users", "idx_email", &["email"], "bogus"),
    );

    let runner = Runner::new(&set, &Sqlite);
    let mut conn = TestConnection::new();
    let outcomes = runner.migrate(&mut conn, Step::All).unwrap();

    assert!(matches!(outcomes[0], Outcome::Failure(_)));
    assert!(!conn.table_exists("users"));
}
