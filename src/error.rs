use thiserror::Error;

use crate::migration::Direction;

/// Errors raised while defining or applying migrations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrateError {
    /// Caller-supplied arguments are structurally invalid. Raised before any
    /// DDL is issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A symmetric migration reached an operation with no derivable inverse.
    #[error("cannot invert `{operation}` on `{table}`")]
    Irreversible { operation: String, table: String },

    /// The migration records no operations for the requested direction.
    #[error("migration `{identifier}` records no {direction} operations")]
    Unsupported {
        identifier: String,
        direction: Direction,
    },

    /// The database rejected a compiled statement.
    #[error("database error: {0}")]
    Database(String),

    /// No dialect is registered under the given identifier.
    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),

    /// The history store failed outside the recoverable missing-table path.
    #[error("history store error: {0}")]
    History(String),
}
