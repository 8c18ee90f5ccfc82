use std::str::FromStr;

use crate::column::Column;
use crate::dialect::Dialect;
use crate::error::MigrateError;

/// Index kinds accepted by [`Operation::AddIndex`].
///
/// The operation itself carries the caller-supplied string; parsing happens
/// during compilation, before any DDL is issued, so a misspelled `unique`
/// never silently degrades to a non-unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    #[default]
    Normal,
    Unique,
}

impl FromStr for IndexKind {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(IndexKind::Normal),
            "unique" => Ok(IndexKind::Unique),
            other => Err(MigrateError::Validation(format!(
                "unknown index kind `{}` (expected `normal` or `unique`)",
                other
            ))),
        }
    }
}

/// One abstract schema operation.
///
/// Each variant carries enough information to compile forward DDL; the subset
/// listed in [`Operation::invert`] additionally declares a deterministic
/// inverse. The rest are irreversible: their forward form does not retain the
/// definitions a reverse would need.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable {
        name: String,
        columns: Vec<Column>,
        has_primary_key: bool,
    },
    DropTable {
        name: String,
    },
    RenameTable {
        old: String,
        new: String,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    RemoveColumn {
        table: String,
        column: String,
    },
    RenameColumn {
        table: String,
        old: String,
        new: String,
    },
    ChangeColumn {
        table: String,
        column: Column,
    },
    AddIndex {
        table: String,
        name: String,
        columns: Vec<String>,
        kind: String,
    },
    RemoveIndex {
        table: String,
        name: String,
    },
    AddRelationship {
        from_table: String,
        to_table: String,
        from_column: String,
        to_column: String,
    },
}

impl Operation {
    /// Create a table with an implicit `id` primary-key column.
    pub fn create_table(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Operation::CreateTable {
            name: name.into(),
            columns,
            has_primary_key: true,
        }
    }

    /// Create a table without the implicit primary key.
    pub fn create_table_keyless(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Operation::CreateTable {
            name: name.into(),
            columns,
            has_primary_key: false,
        }
    }

    pub fn drop_table(name: impl Into<String>) -> Self {
        Operation::DropTable { name: name.into() }
    }

    pub fn rename_table(old: impl Into<String>, new: impl Into<String>) -> Self {
        Operation::RenameTable {
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Operation::AddColumn {
            table: table.into(),
            column,
        }
    }

    pub fn remove_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Operation::RemoveColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn rename_column(
        table: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Operation::RenameColumn {
            table: table.into(),
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn change_column(table: impl Into<String>, column: Column) -> Self {
        Operation::ChangeColumn {
            table: table.into(),
            column,
        }
    }

    pub fn add_index(
        table: impl Into<String>,
        name: impl Into<String>,
        columns: &[&str],
        kind: impl Into<String>,
    ) -> Self {
        Operation::AddIndex {
            table: table.into(),
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            kind: kind.into(),
        }
    }

    pub fn remove_index(table: impl Into<String>, name: impl Into<String>) -> Self {
        Operation::RemoveIndex {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn add_relationship(
        from_table: impl Into<String>,
        to_table: impl Into<String>,
        from_column: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Operation::AddRelationship {
            from_table: from_table.into(),
            to_table: to_table.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
        }
    }

    /// The synthesized foreign-key constraint name for a relationship owned
    /// by `from_column`. Forward creation and derived removal both use this
    /// rule, so the name is reproducible across runs.
    pub fn relationship_constraint(from_column: &str) -> String {
        format!("fk_{}", from_column)
    }

    /// The table this operation targets, for error reporting.
    pub fn table(&self) -> &str {
        match self {
            Operation::CreateTable { name, .. }
            | Operation::DropTable { name }
            | Operation::RenameTable { old: name, .. } => name,
            Operation::AddColumn { table, .. }
            | Operation::RemoveColumn { table, .. }
            | Operation::RenameColumn { table, .. }
            | Operation::ChangeColumn { table, .. }
            | Operation::AddIndex { table, .. }
            | Operation::RemoveIndex { table, .. } => table,
            Operation::AddRelationship { from_table, .. } => from_table,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Operation::CreateTable { name, .. } => format!("create table {}", name),
            Operation::DropTable { name } => format!("drop table {}", name),
            Operation::RenameTable { old, new } => format!("rename table {} to {}", old, new),
            Operation::AddColumn { table, column } => {
                format!("add column {} to {}", column.name, table)
            }
            Operation::RemoveColumn { table, column } => {
                format!("remove column {} from {}", column, table)
            }
            Operation::RenameColumn { table, old, new } => {
                format!("rename column {} to {} on {}", old, new, table)
            }
            Operation::ChangeColumn { table, column } => {
                format!("change column {} on {}", column.name, table)
            }
            Operation::AddIndex { table, name, .. } => {
                format!("add index {} on {}", name, table)
            }
            Operation::RemoveIndex { table, name } => {
                format!("remove index {} from {}", name, table)
            }
            Operation::AddRelationship {
                from_table,
                to_table,
                ..
            } => format!("add relationship {} -> {}", from_table, to_table),
        }
    }

    /// Derive the operation that undoes this one.
    ///
    /// Returns `None` for operations whose forward form does not retain the
    /// information a reverse would need (drop table, remove column/index,
    /// change column).
    pub fn invert(&self) -> Option<Operation> {
        match self {
            Operation::CreateTable { name, .. } => Some(Operation::drop_table(name.clone())),
            Operation::RenameTable { old, new } => {
                Some(Operation::rename_table(new.clone(), old.clone()))
            }
            Operation::AddColumn { table, column } => {
                Some(Operation::remove_column(table.clone(), column.name.clone()))
            }
            Operation::RenameColumn { table, old, new } => Some(Operation::rename_column(
                table.clone(),
                new.clone(),
                old.clone(),
            )),
            Operation::AddIndex { table, name, .. } => {
                Some(Operation::remove_index(table.clone(), name.clone()))
            }
            Operation::AddRelationship {
                from_table,
                from_column,
                ..
            } => Some(Operation::remove_index(
                from_table.clone(),
                Self::relationship_constraint(from_column),
            )),
            Operation::DropTable { .. }
            | Operation::RemoveColumn { .. }
            | Operation::ChangeColumn { .. }
            | Operation::RemoveIndex { .. } => None,
        }
    }

    pub fn is_invertible(&self) -> bool {
        self.invert().is_some()
    }

    /// Compile this operation to executable DDL for the given dialect and
    /// schema. Validation (index kinds, column modifiers) happens here,
    /// before the caller executes anything.
    pub fn compile(
        &self,
        dialect: &dyn Dialect,
        schema: &str,
    ) -> Result<Vec<String>, MigrateError> {
        match self {
            Operation::CreateTable {
                name,
                columns,
                has_primary_key,
            } => dialect.create_table_sql(schema, name, columns, *has_primary_key),
            Operation::DropTable { name } => Ok(vec![dialect.drop_table_sql(schema, name)]),
            Operation::RenameTable { old, new } => {
                Ok(vec![dialect.rename_table_sql(schema, old, new)])
            }
            Operation::AddColumn { table, column } => {
                Ok(vec![dialect.add_column_sql(schema, table, column)?])
            }
            Operation::RemoveColumn { table, column } => {
                Ok(vec![dialect.remove_column_sql(schema, table, column)])
            }
            Operation::RenameColumn { table, old, new } => {
                Ok(vec![dialect.rename_column_sql(schema, table, old, new)])
            }
            Operation::ChangeColumn { table, column } => {
                Ok(vec![dialect.change_column_sql(schema, table, column)?])
            }
            Operation::AddIndex {
                table,
                name,
                columns,
                kind,
            } => {
                let kind: IndexKind = kind.parse()?;
                Ok(vec![dialect.add_index_sql(schema, table, name, columns, kind)])
            }
            Operation::RemoveIndex { table, name } => {
                Ok(vec![dialect.remove_index_sql(schema, table, name)])
            }
            Operation::AddRelationship {
                from_table,
                to_table,
                from_column,
                to_column,
            } => dialect.add_relationship_sql(schema, from_table, to_table, from_column, to_column),
        }
    }
}
