use std::collections::BTreeMap;
use std::fmt;

use crate::column::Column;
use crate::connection::Connection;
use crate::driver::SchemaDriver;
use crate::error::MigrateError;
use crate::operation::Operation;

/// Which way a migration is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// How a migration describes its two directions.
///
/// A symmetric plan records one operation list and derives the reverse from
/// it. An explicit plan carries separate lists, with the reverse optional.
#[derive(Debug, Clone)]
enum Plan {
    Symmetric(Vec<Operation>),
    Explicit {
        up: Vec<Operation>,
        down: Option<Vec<Operation>>,
    },
}

/// A named, self-contained schema change.
#[derive(Debug, Clone)]
pub struct Migration {
    identifier: &'static str,
    plan: Plan,
}

impl Migration {
    /// A migration whose reverse is derived by inverting its operations in
    /// reverse order.
    pub fn symmetric(identifier: &'static str) -> Self {
        Self {
            identifier,
            plan: Plan::Symmetric(Vec::new()),
        }
    }

    /// A migration with author-supplied operation lists for each direction.
    pub fn explicit(
        identifier: &'static str,
        up: Vec<Operation>,
        down: Vec<Operation>,
    ) -> Self {
        Self {
            identifier,
            plan: Plan::Explicit {
                up,
                down: Some(down),
            },
        }
    }

    /// An explicit migration with no reverse. Attempting to revert it fails
    /// without touching the database.
    pub fn forward_only(identifier: &'static str, up: Vec<Operation>) -> Self {
        Self {
            identifier,
            plan: Plan::Explicit { up, down: None },
        }
    }

    pub fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// Append an operation; an explicit plan grows its forward list.
    pub fn operation(mut self, op: Operation) -> Self {
        match &mut self.plan {
            Plan::Symmetric(ops) => ops.push(op),
            Plan::Explicit { up, .. } => up.push(op),
        }
        self
    }

    pub fn create_table(self, name: &str, columns: Vec<Column>) -> Self {
        self.operation(Operation::create_table(name, columns))
    }

    pub fn drop_table(self, name: &str) -> Self {
        self.operation(Operation::drop_table(name))
    }

    pub fn rename_table(self, old: &str, new: &str) -> Self {
        self.operation(Operation::rename_table(old, new))
    }

    pub fn add_column(self, table: &str, column: Column) -> Self {
        self.operation(Operation::add_column(table, column))
    }

    pub fn remove_column(self, table: &str, column: &str) -> Self {
        self.operation(Operation::remove_column(table, column))
    }

    pub fn rename_column(self, table: &str, old: &str, new: &str) -> Self {
        self.operation(Operation::rename_column(table, old, new))
    }

    pub fn change_column(self, table: &str, column: Column) -> Self {
        self.operation(Operation::change_column(table, column))
    }

    pub fn add_index(self, table: &str, name: &str, columns: &[&str], kind: &str) -> Self {
        self.operation(Operation::add_index(table, name, columns, kind))
    }

    pub fn remove_index(self, table: &str, name: &str) -> Self {
        self.operation(Operation::remove_index(table, name))
    }

    pub fn add_relationship(
        self,
        from_table: &str,
        to_table: &str,
        from_column: &str,
        to_column: &str,
    ) -> Self {
        self.operation(Operation::add_relationship(
            from_table,
            to_table,
            from_column,
            to_column,
        ))
    }

    /// Whether this migration can be reverted.
    pub fn is_reversible(&self) -> bool {
        match &self.plan {
            Plan::Symmetric(ops) => ops.iter().all(Operation::is_invertible),
            Plan::Explicit { down, .. } => down.is_some(),
        }
    }

    /// The operations to run for `direction`.
    ///
    /// For a symmetric reverse, the whole inverse list is derived before
    /// anything runs, so an irreversible operation anywhere in the plan
    /// fails the migration without issuing DDL.
    fn operations(&self, direction: Direction) -> Result<Vec<Operation>, MigrateError> {
        match (&self.plan, direction) {
            (Plan::Symmetric(ops), Direction::Forward) => Ok(ops.clone()),
            (Plan::Symmetric(ops), Direction::Reverse) => ops
                .iter()
                .rev()
                .map(|op| {
                    op.invert().ok_or_else(|| MigrateError::Irreversible {
                        operation: op.describe(),
                        table: op.table().to_string(),
                    })
                })
                .collect(),
            (Plan::Explicit { up, .. }, Direction::Forward) => Ok(up.clone()),
            (Plan::Explicit { down, .. }, Direction::Reverse) => {
                down.clone().ok_or_else(|| MigrateError::Unsupported {
                    identifier: self.identifier.to_string(),
                    direction: Direction::Reverse,
                })
            }
        }
    }

    /// Run this migration in `direction` on `driver`.
    pub fn apply<C: Connection>(
        &self,
        direction: Direction,
        driver: &mut SchemaDriver<'_, C>,
    ) -> Result<(), MigrateError> {
        for op in self.operations(direction)? {
            driver.apply(&op)?;
        }
        Ok(())
    }
}

/// The migrations known to a project, held in identifier order.
#[derive(Debug, Default)]
pub struct MigrationSet {
    migrations: BTreeMap<&'static str, Migration>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, migration: Migration) {
        self.migrations.insert(migration.identifier(), migration);
    }

    pub fn get(&self, identifier: &str) -> Option<&Migration> {
        self.migrations.get(identifier)
    }

    /// Migrations in ascending identifier order.
    pub fn in_order(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.values()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
