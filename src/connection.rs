use chrono::Utc;

use crate::error::MigrateError;
use crate::history::{HistoryEntry, HistoryError, HistoryStore};

/// A database connection capable of executing DDL inside transactions.
///
/// Implementations live behind feature gates; [`MemoryConnection`] is always
/// available for tests and dry runs.
pub trait Connection {
    fn execute(&mut self, sql: &str) -> Result<(), MigrateError>;

    /// Run a script of one or more statements as a unit.
    fn execute_batch(&mut self, sql: &str) -> Result<(), MigrateError>;

    fn begin(&mut self) -> Result<(), MigrateError>;
    fn commit(&mut self) -> Result<(), MigrateError>;
    fn rollback(&mut self) -> Result<(), MigrateError>;
}

/// An in-memory connection that records every statement instead of running
/// it, with a history store to match. No migration state survives the value
/// itself.
#[derive(Debug, Default)]
pub struct MemoryConnection {
    executed: Vec<String>,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    fail_on: Option<String>,
    history: Vec<HistoryEntry>,
    history_missing: bool,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection whose tracking table does not exist yet.
    pub fn without_history() -> Self {
        Self {
            history_missing: true,
            ..Self::default()
        }
    }

    /// Fail any statement containing `fragment` with a database error.
    pub fn fail_when_contains(mut self, fragment: impl Into<String>) -> Self {
        self.fail_on = Some(fragment.into());
        self
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn begins(&self) -> usize {
        self.begins
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    pub fn history_identifiers(&self) -> Vec<&str> {
        self.history.iter().map(|e| e.identifier.as_str()).collect()
    }

    fn check(&self, sql: &str) -> Result<(), MigrateError> {
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(MigrateError::Database(format!(
                    "statement rejected: {sql}"
                )));
            }
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.check(sql)?;
        self.executed.push(sql.to_string());
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.check(sql)?;
        self.executed.push(sql.to_string());
        if sql.contains("CREATE TABLE") && sql.contains("migrations") {
            self.history_missing = false;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), MigrateError> {
        self.begins += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), MigrateError> {
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), MigrateError> {
        self.rollbacks += 1;
        Ok(())
    }
}

impl HistoryStore for MemoryConnection {
    fn probe(&mut self) -> Result<(), HistoryError> {
        if self.history_missing {
            return Err(HistoryError::MissingTable);
        }
        Ok(())
    }

    fn applied(&mut self) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.probe()?;
        Ok(self.history.clone())
    }

    fn record(&mut self, identifier: &str) -> Result<(), HistoryError> {
        self.history.push(HistoryEntry {
            identifier: identifier.to_string(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    fn remove(&mut self, identifier: &str) -> Result<(), HistoryError> {
        self.history.retain(|e| e.identifier != identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_statements_in_order() {
        let mut conn = MemoryConnection::new();
        conn.execute("CREATE TABLE a (id int)").unwrap();
        conn.execute("DROP TABLE a").unwrap();
        assert_eq!(
            conn.executed(),
            &["CREATE TABLE a (id int)", "DROP TABLE a"]
        );
    }

    #[test]
    fn fails_matching_statements() {
        let mut conn = MemoryConnection::new().fail_when_contains("DROP");
        conn.execute("CREATE TABLE a (id int)").unwrap();
        let err = conn.execute("DROP TABLE a").unwrap_err();
        assert!(matches!(err, MigrateError::Database(_)));
        assert_eq!(conn.executed().len(), 1);
    }

    #[test]
    fn probe_reports_missing_history() {
        let mut conn = MemoryConnection::without_history();
        assert!(matches!(conn.probe(), Err(HistoryError::MissingTable)));
    }

    #[test]
    fn bootstrap_batch_restores_history() {
        let mut conn = MemoryConnection::without_history();
        conn.execute_batch("CREATE TABLE migrations (id INTEGER)")
            .unwrap();
        assert!(conn.probe().is_ok());
    }

    #[test]
    fn record_and_remove_round_trip() {
        let mut conn = MemoryConnection::new();
        conn.record("create_users").unwrap();
        conn.record("add_email").unwrap();
        assert_eq!(conn.history_identifiers(), vec!["create_users", "add_email"]);

        conn.remove("add_email").unwrap();
        assert_eq!(conn.history_identifiers(), vec!["create_users"]);
    }

    #[test]
    fn applied_preserves_apply_order() {
        let mut conn = MemoryConnection::new();
        conn.record("b_second").unwrap();
        conn.record("a_first").unwrap();
        let ids: Vec<String> = conn
            .applied()
            .unwrap()
            .into_iter()
            .map(|e| e.identifier)
            .collect();
        assert_eq!(ids, vec!["b_second", "a_first"]);
    }
}
