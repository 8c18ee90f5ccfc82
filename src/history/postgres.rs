use chrono::NaiveDateTime;
use postgres::error::SqlState;
use postgres::Client;

use crate::connection::Connection;
use crate::error::MigrateError;
use crate::history::{HistoryEntry, HistoryError, HistoryStore};

/// PostgreSQL-backed connection and migration history.
///
/// The tracking table lives in the configured schema; DDL statements carry
/// their own qualification.
pub struct PostgresConnection<'a> {
    client: &'a mut Client,
    schema: String,
}

impl<'a> PostgresConnection<'a> {
    pub fn new(client: &'a mut Client) -> Self {
        Self::with_schema(client, "public")
    }

    pub fn with_schema(client: &'a mut Client, schema: &str) -> Self {
        Self {
            client,
            schema: schema.to_string(),
        }
    }
}

fn missing_table(err: &postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNDEFINED_TABLE)
}

impl Connection for PostgresConnection<'_> {
    fn execute(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.client
            .execute(sql, &[])
            .map_err(|e| MigrateError::Database(e.to_string()))?;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.client
            .batch_execute(sql)
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

impl HistoryStore for PostgresConnection<'_> {
    fn probe(&mut self) -> Result<(), HistoryError> {
        let sql = format!("SELECT id FROM {}.migrations LIMIT 1", self.schema);
        match self.client.query(&sql, &[]) {
            Ok(_) => Ok(()),
            Err(e) if missing_table(&e) => Err(HistoryError::MissingTable),
            Err(e) => Err(HistoryError::Backend(e.to_string())),
        }
    }

    fn applied(&mut self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let sql = format!(
            "SELECT name, applied_at FROM {}.migrations ORDER BY id",
            self.schema
        );
        let rows = self.client.query(&sql, &[]).map_err(|e| {
            if missing_table(&e) {
                HistoryError::MissingTable
            } else {
                HistoryError::Backend(e.to_string())
            }
        })?;

        Ok(rows
            .iter()
            .map(|row| {
                let applied_at: NaiveDateTime = row.get(1);
                HistoryEntry {
                    identifier: row.get(0),
                    applied_at: applied_at.and_utc(),
                }
            })
            .collect())
    }

    fn record(&mut self, identifier: &str) -> Result<(), HistoryError> {
        let sql = format!("INSERT INTO {}.migrations (name) VALUES ($1)", self.schema);
        self.client
            .execute(&sql, &[&identifier])
            .map_err(|e| HistoryError::Backend(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, identifier: &str) -> Result<(), HistoryError> {
        let sql = format!("DELETE FROM {}.migrations WHERE name = $1", self.schema);
        self.client
            .execute(&sql, &[&identifier])
            .map_err(|e| HistoryError::Backend(e.to_string()))?;
        Ok(())
    }
}
