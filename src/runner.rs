use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::connection::Connection;
use crate::dialect::Dialect;
use crate::driver::SchemaDriver;
use crate::error::MigrateError;
use crate::history::{HistoryError, HistoryStore};
use crate::migration::{Direction, Migration, MigrationSet};

/// How many migrations one run may process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    All,
    Limit(usize),
}

impl Step {
    fn limit(self) -> usize {
        match self {
            Step::All => usize::MAX,
            Step::Limit(n) => n,
        }
    }
}

impl FromStr for Step {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Step::All);
        }
        s.parse::<usize>()
            .map(Step::Limit)
            .map_err(|_| MigrateError::Validation(format!("invalid step count `{s}`")))
    }
}

/// What happened to one migration during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(msg) => write!(f, "ok: {msg}"),
            Outcome::Failure(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Applies and reverts migrations from a [`MigrationSet`], one transaction
/// per migration, recording each in the history table.
pub struct Runner<'a> {
    set: &'a MigrationSet,
    dialect: &'a dyn Dialect,
    schema: String,
}

impl<'a> Runner<'a> {
    pub fn new(set: &'a MigrationSet, dialect: &'a dyn Dialect) -> Self {
        Self {
            set,
            dialect,
            schema: dialect.default_schema().to_string(),
        }
    }

    pub fn with_schema(set: &'a MigrationSet, dialect: &'a dyn Dialect, schema: &str) -> Self {
        Self {
            set,
            dialect,
            schema: schema.to_string(),
        }
    }

    /// Apply pending migrations, in identifier order, up to `step` of them.
    ///
    /// A failure stops the run; migrations already processed keep their
    /// outcomes and their committed effects.
    pub fn migrate<C>(&self, conn: &mut C, step: Step) -> Result<Vec<Outcome>, MigrateError>
    where
        C: Connection + HistoryStore,
    {
        self.ensure_history(conn)?;

        let applied: BTreeSet<String> = conn
            .applied()
            .map_err(history_error)?
            .into_iter()
            .map(|e| e.identifier)
            .collect();

        let pending: Vec<&Migration> = self
            .set
            .in_order()
            .filter(|m| !applied.contains(m.identifier()))
            .take(step.limit())
            .collect();

        let mut outcomes = Vec::with_capacity(pending.len());
        for migration in pending {
            match self.apply_unit(conn, migration, Direction::Forward) {
                Ok(()) => {
                    info!(migration = migration.identifier(), "applied");
                    outcomes.push(Outcome::Success(format!(
                        "Applied migration {}",
                        migration.identifier()
                    )));
                }
                Err(e) => {
                    warn!(migration = migration.identifier(), error = %e, "apply failed");
                    outcomes.push(Outcome::Failure(format!(
                        "Migration {} failed: {}",
                        migration.identifier(),
                        e
                    )));
                    break;
                }
            }
        }

        Ok(outcomes)
    }

    /// Revert applied migrations, most recent first, up to `step` of them.
    pub fn rollback<C>(&self, conn: &mut C, step: Step) -> Result<Vec<Outcome>, MigrateError>
    where
        C: Connection + HistoryStore,
    {
        self.ensure_history(conn)?;

        let recorded: Vec<String> = conn
            .applied()
            .map_err(history_error)?
            .into_iter()
            .map(|e| e.identifier)
            .collect();

        let mut outcomes = Vec::new();
        for identifier in recorded.iter().rev().take(step.limit()) {
            let Some(migration) = self.set.get(identifier) else {
                warn!(migration = identifier.as_str(), "not registered, stopping");
                outcomes.push(Outcome::Failure(format!(
                    "Migration {identifier} is recorded but not registered"
                )));
                break;
            };

            match self.apply_unit(conn, migration, Direction::Reverse) {
                Ok(()) => {
                    info!(migration = migration.identifier(), "reverted");
                    outcomes.push(Outcome::Success(format!(
                        "Reverted migration {}",
                        migration.identifier()
                    )));
                }
                Err(e) => {
                    warn!(migration = migration.identifier(), error = %e, "revert failed");
                    outcomes.push(Outcome::Failure(format!(
                        "Migration {} failed: {}",
                        migration.identifier(),
                        e
                    )));
                    break;
                }
            }
        }

        Ok(outcomes)
    }

    /// Run one migration and its history update in a single transaction.
    fn apply_unit<C>(
        &self,
        conn: &mut C,
        migration: &Migration,
        direction: Direction,
    ) -> Result<(), MigrateError>
    where
        C: Connection + HistoryStore,
    {
        if !self.dialect.supports_transactional_ddl() {
            warn!(
                migration = migration.identifier(),
                "dialect cannot roll back ddl, running unwrapped"
            );
            return self.run_unit(conn, migration, direction);
        }

        conn.begin()?;

        let result = self.run_unit(conn, migration, direction);
        match result {
            Ok(()) => {
                if let Err(e) = conn.commit() {
                    conn.rollback()?;
                    return Err(e);
                }
                Ok(())
            }
            Err(e) => {
                conn.rollback()?;
                Err(e)
            }
        }
    }

    fn run_unit<C>(
        &self,
        conn: &mut C,
        migration: &Migration,
        direction: Direction,
    ) -> Result<(), MigrateError>
    where
        C: Connection + HistoryStore,
    {
        {
            let mut driver = SchemaDriver::with_schema(self.dialect, conn, &self.schema);
            migration.apply(direction, &mut driver)?;
        }

        match direction {
            Direction::Forward => conn.record(migration.identifier()).map_err(history_error),
            Direction::Reverse => conn.remove(migration.identifier()).map_err(history_error),
        }
    }

    /// Create the tracking table on first contact with a database.
    fn ensure_history<C>(&self, conn: &mut C) -> Result<(), MigrateError>
    where
        C: Connection + HistoryStore,
    {
        match conn.probe() {
            Ok(()) => Ok(()),
            Err(HistoryError::MissingTable) => {
                info!(
                    dialect = self.dialect.name(),
                    schema = self.schema.as_str(),
                    "creating migration history table"
                );
                conn.execute_batch(&self.dialect.bootstrap_sql(&self.schema))
            }
            Err(HistoryError::Backend(e)) => Err(MigrateError::History(e)),
        }
    }
}

fn history_error(err: HistoryError) -> MigrateError {
    MigrateError::History(err.to_string())
}
