use chrono::NaiveDateTime;
use rusqlite::Connection as RusqliteConnection;

use crate::connection::Connection;
use crate::error::MigrateError;
use crate::history::{HistoryEntry, HistoryError, HistoryStore};

/// SQLite-backed connection and migration history.
pub struct SqliteConnection<'a> {
    conn: &'a RusqliteConnection,
}

impl<'a> SqliteConnection<'a> {
    pub fn new(conn: &'a RusqliteConnection) -> Self {
        Self { conn }
    }
}

fn missing_table(err: &rusqlite::Error) -> bool {
    err.to_string().contains("no such table")
}

impl Connection for SqliteConnection<'_> {
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

impl HistoryStore for SqliteConnection<'_> {
    fn probe(&mut self) -> Result<(), HistoryError> {
        match self.conn.prepare("SELECT id FROM migrations LIMIT 1") {
            Ok(_) => Ok(()),
            Err(e) if missing_table(&e) => Err(HistoryError::MissingTable),
            Err(e) => Err(HistoryError::Backend(e.to_string())),
        }
    }

    fn applied(&mut self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, applied_at FROM migrations ORDER BY id")
            .map_err(|e| {
                if missing_table(&e) {
                    HistoryError::MissingTable
                } else {
                    HistoryError::Backend(e.to_string())
                }
            })?;

        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let applied_at: String = row.get(1)?;
                Ok((name, applied_at))
            })
            .map_err(|e| HistoryError::Backend(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HistoryError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(|(identifier, applied_at)| {
                let applied_at =
                    NaiveDateTime::parse_from_str(&applied_at, "%Y-%m-%d %H:%M:%S")
                        .map_err(|e| HistoryError::Backend(e.to_string()))?
                        .and_utc();
                Ok(HistoryEntry {
                    identifier,
                    applied_at,
                })
            })
            .collect()
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
