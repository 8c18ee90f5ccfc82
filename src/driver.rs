use tracing::debug;

use crate::column::Column;
use crate::connection::Connection;
use crate::dialect::Dialect;
use crate::error::MigrateError;
use crate::operation::Operation;

/// Compiles abstract operations against one dialect and executes the
/// resulting DDL on a connection.
pub struct SchemaDriver<'a, C: Connection> {
    dialect: &'a dyn Dialect,
    schema: String,
    conn: &'a mut C,
}

impl<'a, C: Connection> SchemaDriver<'a, C> {
    pub fn new(dialect: &'a dyn Dialect, conn: &'a mut C) -> Self {
        Self {
            dialect,
            schema: dialect.default_schema().to_string(),
            conn,
        }
    }

    pub fn with_schema(dialect: &'a dyn Dialect, conn: &'a mut C, schema: &str) -> Self {
        Self {
            dialect,
            schema: schema.to_string(),
            conn,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Switch the working schema; `None` restores the dialect default.
    pub fn set_schema(&mut self, schema: Option<&str>) {
        self.schema = schema
            .unwrap_or_else(|| self.dialect.default_schema())
            .to_string();
    }

    /// Compile an operation and execute every statement it produces.
    pub fn apply(&mut self, op: &Operation) -> Result<(), MigrateError> {
        for sql in op.compile(self.dialect, &self.schema)? {
            debug!(dialect = self.dialect.name(), %sql, "executing ddl");
            self.conn.execute(&sql)?;
        }
        Ok(())
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<(), MigrateError> {
        self.apply(&Operation::create_table(name, columns))
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), MigrateError> {
        self.apply(&Operation::drop_table(name))
    }

    pub fn rename_table(&mut self, old: &str, new: &str) -> Result<(), MigrateError> {
        self.apply(&Operation::rename_table(old, new))
    }

    pub fn add_column(&mut self, table: &str, column: Column) -> Result<(), MigrateError> {
        self.apply(&Operation::add_column(table, column))
    }

    pub fn remove_column(&mut self, table: &str, column: &str) -> Result<(), MigrateError> {
        self.apply(&Operation::remove_column(table, column))
    }

    pub fn rename_column(&mut self, table: &str, old: &str, new: &str) -> Result<(), MigrateError> {
        self.apply(&Operation::rename_column(table, old, new))
    }

    pub fn change_column(&mut self, table: &str, column: Column) -> Result<(), MigrateError> {
        self.apply(&Operation::change_column(table, column))
    }

    pub fn add_index(
        &mut self,
        table: &str,
        name: &str,
        columns: &[&str],
        kind: &str,
    ) -> Result<(), MigrateError> {
        self.apply(&Operation::add_index(table, name, columns, kind))
    }

    pub fn remove_index(&mut self, table: &str, name: &str) -> Result<(), MigrateError> {
        self.apply(&Operation::remove_index(table, name))
    }

    pub fn add_relationship(
        &mut self,
        from_table: &str,
        to_table: &str,
        from_column: &str,
        to_column: &str,
    ) -> Result<(), MigrateError> {
        self.apply(&Operation::add_relationship(
            from_table,
            to_table,
            from_column,
            to_column,
        ))
    }

    pub fn create_schema(&mut self, name: &str) -> Result<(), MigrateError> {
        let sql = self.dialect.create_schema_sql(name)?;
        debug!(dialect = self.dialect.name(), %sql, "executing ddl");
        self.conn.execute(&sql)
    }

    /// Escape hatch for DDL the abstract operations cannot express.
    pub fn execute_raw(&mut self, sql: &str) -> Result<(), MigrateError> {
        self.conn.execute(sql)
    }
}
