mod postgres;
mod sqlite;

pub use postgres::Postgres;
pub use sqlite::Sqlite;

use sea_query::{
    Alias, Index as SeaIndex, IndexCreateStatement, IndexDropStatement, IntoTableRef, Table,
    TableAlterStatement, TableCreateStatement, TableDropStatement, TableRef,
    TableRenameStatement,
};

use crate::column::{Column, ColumnType};
use crate::error::MigrateError;
use crate::operation::{IndexKind, Operation};

static POSTGRES: Postgres = Postgres;
static SQLITE: Sqlite = Sqlite;

/// Resolve a dialect by its configured identifier.
///
/// Unknown identifiers are a configuration error, raised before any
/// migration work begins.
pub fn for_name(name: &str) -> Result<&'static dyn Dialect, MigrateError> {
    match name.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(&POSTGRES),
        "sqlite" | "sqlite3" => Ok(&SQLITE),
        other => Err(MigrateError::UnknownDialect(other.to_string())),
    }
}

/// One database engine's DDL syntax and type vocabulary.
///
/// Implementations supply the statement renderers and capability flags; the
/// default methods compose schema-qualified statements from abstract inputs.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Schema used when the caller configures none (`public` on PostgreSQL).
    fn default_schema(&self) -> &'static str;

    fn supports_schemas(&self) -> bool;
    fn supports_transactional_ddl(&self) -> bool;
    fn supports_alter_column(&self) -> bool;
    fn supports_add_constraint(&self) -> bool;

    /// Static DDL that creates the `migrations` tracking table.
    fn bootstrap_script(&self) -> &'static str;

    /// Bootstrap DDL targeted at `schema`, for dialects whose statements are
    /// otherwise schema-qualified. The table must land in `schema`, not
    /// wherever the session default points.
    fn bootstrap_sql(&self, schema: &str) -> String;

    fn build_table_create(&self, stmt: TableCreateStatement) -> String;
    fn build_table_drop(&self, stmt: TableDropStatement) -> String;
    fn build_table_rename(&self, stmt: TableRenameStatement) -> String;
    fn build_table_alter(&self, stmt: TableAlterStatement) -> String;
    fn build_index_create(&self, stmt: IndexCreateStatement) -> String;
    fn build_index_drop(&self, stmt: IndexDropStatement) -> String;

    fn quote_identifier(&self, name: &str) -> String;

    fn table_ref(&self, schema: &str, table: &str) -> TableRef {
        if self.supports_schemas() {
            (Alias::new(schema), Alias::new(table)).into_table_ref()
        } else {
            Alias::new(table).into_table_ref()
        }
    }

    fn qualified_name(&self, schema: &str, table: &str) -> String {
        if self.supports_schemas() {
            format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            )
        } else {
            self.quote_identifier(table)
        }
    }

    fn create_table_sql(
        &self,
        schema: &str,
        name: &str,
        columns: &[Column],
        has_primary_key: bool,
    ) -> Result<Vec<String>, MigrateError> {
        let mut stmt = Table::create();
        stmt.table(self.table_ref(schema, name));

        // add a default id column unless told not to
        if has_primary_key {
            stmt.col(Column::new("id", ColumnType::PrimaryKey).compile()?);
        }

        for column in columns {
            stmt.col(column.compile()?);
        }

        Ok(vec![self.build_table_create(stmt)])
    }

    fn drop_table_sql(&self, schema: &str, name: &str) -> String {
        let stmt = Table::drop().table(self.table_ref(schema, name)).to_owned();
        self.build_table_drop(stmt)
    }

    fn rename_table_sql(&self, schema: &str, old: &str, new: &str) -> String {
        // the new name must stay unqualified; the table cannot change schema
        let stmt = Table::rename()
            .table(self.table_ref(schema, old), Alias::new(new).into_table_ref())
            .to_owned();
        self.build_table_rename(stmt)
    }

    fn add_column_sql(
        &self,
        schema: &str,
        table: &str,
        column: &Column,
    ) -> Result<String, MigrateError> {
        let stmt = Table::alter()
            .table(self.table_ref(schema, table))
            .add_column(column.compile()?)
            .to_owned();
        Ok(self.build_table_alter(stmt))
    }

    fn remove_column_sql(&self, schema: &str, table: &str, column: &str) -> String {
        let stmt = Table::alter()
            .table(self.table_ref(schema, table))
            .drop_column(Alias::new(column))
            .to_owned();
        self.build_table_alter(stmt)
    }

    fn rename_column_sql(&self, schema: &str, table: &str, old: &str, new: &str) -> String {
        let stmt = Table::alter()
            .table(self.table_ref(schema, table))
            .rename_column(Alias::new(old), Alias::new(new))
            .to_owned();
        self.build_table_alter(stmt)
    }

    fn change_column_sql(
        &self,
        schema: &str,
        table: &str,
        column: &Column,
    ) -> Result<String, MigrateError> {
        if !self.supports_alter_column() {
            return Err(MigrateError::Validation(format!(
                "dialect `{}` cannot change column definitions in place",
                self.name()
            )));
        }
        let stmt = Table::alter()
            .table(self.table_ref(schema, table))
            .modify_column(column.compile()?)
            .to_owned();
        Ok(self.build_table_alter(stmt))
    }

    fn add_index_sql(
        &self,
        schema: &str,
        table: &str,
        name: &str,
        columns: &[String],
        kind: IndexKind,
    ) -> String {
        let mut stmt = SeaIndex::create();
        stmt.name(name).table(self.table_ref(schema, table));

        if kind == IndexKind::Unique {
            stmt.unique();
        }

        for column in columns {
            stmt.col(Alias::new(column));
        }

        self.build_index_create(stmt.to_owned())
    }

    fn remove_index_sql(&self, schema: &str, table: &str, name: &str) -> String {
        let stmt = SeaIndex::drop()
            .name(name)
            .table(self.table_ref(schema, table))
            .to_owned();
        self.build_index_drop(stmt)
    }

    fn add_relationship_sql(
        &self,
        schema: &str,
        from_table: &str,
        to_table: &str,
        from_column: &str,
        to_column: &str,
    ) -> Result<Vec<String>, MigrateError> {
        if !self.supports_add_constraint() {
            return Err(MigrateError::Validation(format!(
                "dialect `{}` cannot add constraints to existing tables",
                self.name()
            )));
        }

        // sea-query's ALTER TABLE ADD CONSTRAINT support is limited, so the
        // statement is assembled by hand, as for CHECK constraints.
        let constraint = Operation::relationship_constraint(from_column);
        Ok(vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) MATCH FULL",
            self.qualified_name(schema, from_table),
            self.quote_identifier(&constraint),
            self.quote_identifier(from_column),
            self.qualified_name(schema, to_table),
            self.quote_identifier(to_column),
        )])
    }

    fn create_schema_sql(&self, name: &str) -> Result<String, MigrateError> {
        if !self.supports_schemas() {
            return Err(MigrateError::Validation(format!(
                "dialect `{}` has no schemas",
                self.name()
            )));
        }
        Ok(format!("CREATE SCHEMA {}", self.quote_identifier(name)))
    }
}
