//! The [`Weave`] entry point: a driver, a configuration and a schema
//! registry.
//!
//! ```ignore
//! let mut db = Weave::sqlite();
//! let contact = db.register::<Contact>();
//! let q = db.from(&contact).filter(Shorthand::new().equals("city", "Austin"))?;
//! let stmt = db.prepare(&q)?;
//! ```

use crate::builder::{DeleteQuery, SelectQuery, StatementBuilder, StatementKind, UpdateQuery};
use crate::built::BuiltStatement;
use crate::config::{DangerousDmlPolicy, WeaveConfig};
use crate::driver::{Driver, DriverRef, PostgresDriver, SqliteDriver};
use crate::error::{WeaveError, WeaveResult};
use crate::schema::statements::{self, RowOptions};
use crate::schema::{SchemaRegistry, Table, TableHandle, TableSchema};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Weave {
    driver: DriverRef,
    config: WeaveConfig,
    registry: SchemaRegistry,
}

impl Weave {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::with_driver(Arc::new(driver))
    }

    pub fn with_driver(driver: DriverRef) -> Self {
        Self {
            driver,
            config: WeaveConfig::default(),
            registry: SchemaRegistry::new(),
        }
    }

    pub fn sqlite() -> Self {
        Self::new(SqliteDriver::new())
    }

    pub fn postgres() -> Self {
        Self::new(PostgresDriver::new())
    }

    /// Build the driver described by `config`.
    pub fn from_config(config: WeaveConfig) -> Self {
        Self {
            driver: config.driver(),
            config,
            registry: SchemaRegistry::new(),
        }
    }

    /// Replace the configuration, keeping the current driver.
    pub fn with_config(mut self, config: WeaveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    // ==================== Schemas ====================

    pub fn register<T: Table>(&mut self) -> TableHandle {
        self.registry.register::<T>()
    }

    pub fn register_schema(&mut self, schema: TableSchema) -> TableHandle {
        self.registry.register_schema(schema)
    }

    /// A registered table by logical name.
    pub fn table(&self, name: &str) -> WeaveResult<TableHandle> {
        self.registry.get(name)
    }

    fn handle_of<T: Table>(&self) -> TableHandle {
        let schema = T::schema();
        self.registry
            .get(schema.name())
            .unwrap_or_else(|_| TableHandle::new(schema))
    }

    // ==================== Statements ====================

    pub fn from(&self, table: &TableHandle) -> SelectQuery {
        SelectQuery::new(table, self.driver.clone())
    }

    pub fn from_table<T: Table>(&self) -> SelectQuery {
        self.from(&self.handle_of::<T>())
    }

    pub fn update(&self, table: &TableHandle) -> UpdateQuery {
        UpdateQuery::new(table, self.driver.clone())
    }

    pub fn delete_from(&self, table: &TableHandle) -> DeleteQuery {
        DeleteQuery::new(table, self.driver.clone())
    }

    /// Build a statement for execution.
    ///
    /// UPDATE and DELETE without WHERE are handled by the configured
    /// [`DangerousDmlPolicy`] unless the builder was forced.
    pub fn prepare<B: StatementBuilder>(&self, builder: &B) -> WeaveResult<BuiltStatement> {
        builder.validate()?;
        let kind = builder.kind();
        if !builder.has_where() && !builder.is_forced() {
            self.check_guard(kind, builder.table().name())?;
        }
        let built = builder.build();
        self.log_statement(kind.as_str(), &built);
        Ok(built)
    }

    fn check_guard(&self, kind: StatementKind, table: &str) -> WeaveResult<()> {
        let policy = match kind {
            StatementKind::Select => DangerousDmlPolicy::Allow,
            StatementKind::Update => self.config.update_without_where,
            StatementKind::Delete => self.config.delete_without_where,
        };
        match policy {
            DangerousDmlPolicy::Allow => Ok(()),
            DangerousDmlPolicy::Warn => {
                tracing::warn!(target: "sqlweave.sql", statement = kind.as_str(), table, "statement has no WHERE clause");
                Ok(())
            }
            DangerousDmlPolicy::Error => {
                tracing::warn!(target: "sqlweave.sql", statement = kind.as_str(), table, "rejected statement without WHERE clause");
                Err(WeaveError::missing_guard(kind.as_str(), table))
            }
        }
    }

    fn log_statement(&self, statement: &str, built: &BuiltStatement) {
        if !self.config.log_statements {
            return;
        }
        let sql = match self.config.max_logged_sql {
            Some(max) if built.sql.len() > max => {
                format!("{}...", truncate_sql_bytes(&built.sql, max))
            }
            _ => built.sql.clone(),
        };
        tracing::debug!(
            target: "sqlweave.sql",
            statement,
            param_count = built.params.len(),
            sql = %sql,
        );
    }

    // ==================== Schema statements ====================

    pub fn create_table(&self, table: &TableHandle) -> String {
        statements::create_table(table, self.driver.as_ref())
    }

    pub fn drop_table(&self, table: &TableHandle) -> String {
        statements::drop_table(table, self.driver.as_ref())
    }

    pub fn insert_row<T: Table>(&self, row: &T) -> WeaveResult<BuiltStatement> {
        self.insert_row_with(row, &RowOptions::new())
    }

    pub fn insert_row_with<T: Table>(
        &self,
        row: &T,
        options: &RowOptions,
    ) -> WeaveResult<BuiltStatement> {
        let table = self.handle_of::<T>();
        let built = statements::insert(&table, self.driver.as_ref(), row.values(), options)?;
        self.log_statement("INSERT", &built);
        Ok(built)
    }

    /// UPDATE a row by primary key.
    pub fn update_row<T: Table>(&self, row: &T, options: &RowOptions) -> WeaveResult<BuiltStatement> {
        let table = self.handle_of::<T>();
        let built = statements::update(&table, self.driver.as_ref(), row.values(), options)?;
        self.log_statement("UPDATE", &built);
        Ok(built)
    }

    /// DELETE a row by primary key.
    pub fn delete_row<T: Table>(&self, row: &T, options: &RowOptions) -> WeaveResult<BuiltStatement> {
        let table = self.handle_of::<T>();
        let built = statements::delete(&table, self.driver.as_ref(), row.values(), options)?;
        self.log_statement("DELETE", &built);
        Ok(built)
    }
}

/// Cut `sql` to at most `max_bytes` on a char boundary.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::schema::fixtures::*;
    use crate::{Shorthand, sql};

    #[test]
    fn test_prepare_rejects_unguarded_delete() {
        let db = Weave::sqlite();
        let err = db.prepare(&db.delete_from(&contact())).unwrap_err();
        assert_eq!(err, WeaveError::missing_guard("DELETE", "Contact"));

        let built = db.prepare(&db.delete_from(&contact()).force()).unwrap();
        assert_eq!(built.sql, "DELETE FROM \"Contact\"");
    }

    #[test]
    fn test_prepare_honors_policy() {
        let db = Weave::sqlite().with_config(
            WeaveConfig::new().update_without_where(DangerousDmlPolicy::Warn),
        );
        let q = db.update(&contact()).set_values([("age", 40)]).unwrap();
        let built = db.prepare(&q).unwrap();
        assert_eq!(built.sql, "UPDATE \"Contact\" SET \"age\" = $age");
        assert!(db.prepare(&db.delete_from(&contact())).is_err());
    }

    #[test]
    fn test_prepare_rejects_empty_update() {
        let db = Weave::sqlite();
        let q = db
            .update(&contact())
            .filter(Shorthand::new().equals("id", 1))
            .unwrap();
        assert!(matches!(
            db.prepare(&q).unwrap_err(),
            WeaveError::EmptyAssignment { .. }
        ));
    }

    #[test]
    fn test_prepare_guarded_update() {
        let db = Weave::postgres();
        let q = db
            .update(&contact())
            .set(sql!("\"age\" = \"age\" + {}", 1).unwrap())
            .filter(Shorthand::new().equals("id", 7))
            .unwrap();
        let built = db.prepare(&q).unwrap();
        assert_eq!(built.sql, "UPDATE \"Contact\" SET \"age\" = \"age\" + $1 WHERE \"id\" = $id");
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_registry_lookup() {
        let mut db = Weave::from_config(WeaveConfig::new().dialect(Dialect::Postgres));
        db.register_schema(order().schema().clone());
        assert_eq!(db.driver().name(), "postgres");
        let order = db.table("Order").unwrap();
        assert_eq!(db.from(&order).build().sql, "SELECT \"id\", \"contactId\", \"freightId\", \"cost\", \"qty\", \"total\" FROM \"Order\"");
        assert!(matches!(db.table("Nope"), Err(WeaveError::UnknownTable(_))));
    }

    #[test]
    fn test_truncate_sql_bytes() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        assert_eq!(truncate_sql_bytes("é", 1), "");
    }
}
