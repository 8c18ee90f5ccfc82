pub mod column;
pub mod connection;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod history;
pub mod migration;
pub mod operation;
pub mod runner;

pub mod prelude {
    pub use crate::column::{Column, ColumnType, Modifier};
    pub use crate::connection::{Connection, MemoryConnection};
    pub use crate::dialect::{for_name, Dialect, Postgres, Sqlite};
    pub use crate::driver::SchemaDriver;
    pub use crate::error::MigrateError;
    pub use crate::history::{HistoryEntry, HistoryError, HistoryStore};
    pub use crate::migration::{Direction, Migration, MigrationSet};
    pub use crate::operation::{IndexKind, Operation};
    pub use crate::runner::{Outcome, Runner, Step};

    #[cfg(feature = "sqlite")]
    pub use crate::history::SqliteConnection;

    #[cfg(feature = "postgres")]
    pub use crate::history::PostgresConnection;
}
