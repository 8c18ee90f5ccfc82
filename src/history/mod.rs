#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// One row of the `migrations` tracking table.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub identifier: String,
    pub applied_at: DateTime<Utc>,
}

/// Failures reported by a [`HistoryStore`].
///
/// `MissingTable` is recoverable; it signals that the tracking table has not
/// been bootstrapped yet.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("migration tracking table does not exist")]
    MissingTable,
    #[error("history backend error: {0}")]
    Backend(String),
}

/// Persistent record of which migrations have been applied.
pub trait HistoryStore {
    /// Check that the tracking table exists and is queryable.
    fn probe(&mut self) -> Result<(), HistoryError>;

    /// Applied migrations in the order they were applied.
    fn applied(&mut self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Record a migration as applied.
    fn record(&mut self, identifier: &str) -> Result<(), HistoryError>;

    /// Delete a migration's history row after it is reverted.
    fn remove(&mut self, identifier: &str) -> Result<(), HistoryError>;
}
