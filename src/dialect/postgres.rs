use sea_query::{
    IndexCreateStatement, IndexDropStatement, PostgresQueryBuilder, TableAlterStatement,
    TableCreateStatement, TableDropStatement, TableRenameStatement,
};

use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn supports_alter_column(&self) -> bool {
        true
    }

    fn supports_add_constraint(&self) -> bool {
        true
    }

    fn bootstrap_script(&self) -> &'static str {
        include_str!("../../sql/postgres.sql")
    }

    fn bootstrap_sql(&self, schema: &str) -> String {
        // SET LOCAL keeps the search_path change scoped to this batch, so
        // the table lands in the configured schema without disturbing the
        // session
        format!(
            "BEGIN;\nSET LOCAL search_path TO {};\n{}\nCOMMIT;",
            self.quote_identifier(schema),
            self.bootstrap_script().trim_end()
        )
    }

    fn build_table_create(&self, stmt: TableCreateStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_table_drop(&self, stmt: TableDropStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_table_rename(&self, stmt: TableRenameStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_index_drop(&self, stmt: IndexDropStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, ColumnType};

    #[test]
    fn postgres_dialect_name() {
        assert_eq!(Postgres.name(), "postgres");
    }

    #[test]
    fn postgres_default_schema() {
        assert_eq!(Postgres.default_schema(), "public");
    }

    #[test]
    fn postgres_supports_transactional_ddl() {
        assert!(Postgres.supports_transactional_ddl());
    }

    #[test]
    fn postgres_bootstrap_script_creates_tracking_table() {
        let script = Postgres.bootstrap_script();
        assert!(script.contains("CREATE TABLE migrations"));
        assert!(script.contains("SERIAL PRIMARY KEY"));
        assert!(script.contains("applied_at"));
    }

    #[test]
    fn postgres_bootstrap_sql_targets_configured_schema() {
        let sql = Postgres.bootstrap_sql("analytics");
        assert!(sql.contains("SET LOCAL search_path TO \"analytics\""));
        assert!(sql.contains("CREATE TABLE migrations"));
        assert!(sql.trim_end().ends_with("COMMIT;"));
    }

    #[test]
    fn postgres_creates_simple_table() {
        let columns = vec![
            Column::new("name", ColumnType::Text).not_null(),
            Column::new("email", ColumnType::String).limit(255).unique(),
        ];

        let sql = Postgres
            .create_table_sql("public", "users", &columns, true)
            .unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("CREATE TABLE \"public\".\"users\""));
        assert!(sql[0].contains("\"id\" serial"));
        assert!(sql[0].contains("PRIMARY KEY"));
        assert!(sql[0].contains("\"name\" text NOT NULL"));
        assert!(sql[0].contains("\"email\" varchar(255)"));
        assert!(sql[0].contains("UNIQUE"));
    }

    #[test]
    fn postgres_adds_column_with_default() {
        let column = Column::new("active", ColumnType::Boolean)
            .not_null()
            .default("true");
        let sql = Postgres.add_column_sql("public", "users", &column).unwrap();
        assert!(sql.contains("ALTER TABLE \"public\".\"users\""));
        assert!(sql.contains("ADD COLUMN"));
        assert!(sql.contains("DEFAULT true"));
    }

    #[test]
    fn postgres_quotes_identifiers_with_embedded_quotes() {
        assert_eq!(Postgres.quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
