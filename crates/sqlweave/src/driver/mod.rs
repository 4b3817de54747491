//! SQL dialect drivers.
//!
//! A [`Driver`] owns everything dialect-specific: identifier quoting, the
//! naming strategy, pagination syntax, column DDL and value conversion.
//! Builders hold a shared [`DriverRef`] and never format identifiers
//! themselves.

mod postgres;
mod sqlite;

pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

use crate::schema::{ColumnDef, TableSchema, defaults};
use crate::value::Value;
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared driver handle.
pub type DriverRef = Arc<dyn Driver>;

/// How logical table/column names map to database names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Use names as declared.
    #[default]
    Verbatim,
    /// `OrderItem` -> `order_item`, `firstName` -> `first_name`.
    SnakeCase,
}

impl NamingStrategy {
    pub fn table_name(&self, name: &str) -> String {
        self.apply(name)
    }

    pub fn column_name(&self, name: &str) -> String {
        self.apply(name)
    }

    fn apply(&self, name: &str) -> String {
        match self {
            NamingStrategy::Verbatim => name.to_string(),
            NamingStrategy::SnakeCase => name.to_snake_case(),
        }
    }
}

/// Quote an identifier with double quotes, escaping embedded quotes as `""`.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Dialect-specific SQL generation.
pub trait Driver: fmt::Debug + Send + Sync {
    /// Dialect name, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// Naming strategy applied before quoting.
    fn naming(&self) -> NamingStrategy;

    /// Quote a raw identifier.
    fn quote(&self, name: &str) -> String {
        quote_ident(name)
    }

    /// Quote a table name after applying the naming strategy.
    fn quote_table(&self, name: &str) -> String {
        self.quote(&self.naming().table_name(name))
    }

    /// Quote a column name after applying the naming strategy.
    fn quote_column(&self, name: &str) -> String {
        self.quote(&self.naming().column_name(name))
    }

    /// Pagination clause for `skip`/`take`, or an empty string.
    fn pagination(&self, skip: Option<u64>, take: Option<u64>) -> String;

    /// Column definition for `CREATE TABLE`.
    fn column_ddl(&self, column: &ColumnDef) -> String;

    /// `CREATE [UNIQUE] INDEX` statement for an indexed column.
    fn index_ddl(&self, table: &TableSchema, column: &ColumnDef) -> String {
        let kind = if column.unique { "UNIQUE INDEX" } else { "INDEX" };
        let table_name = self.naming().table_name(table.db_table_name());
        let column_name = self.naming().column_name(&column.name);
        format!(
            "CREATE {kind} idx_{table_name}_{column_name} ON {} ({})",
            self.quote_table(table.db_table_name()),
            self.quote_column(&column.name)
        )
    }

    /// Query listing user tables.
    fn table_names_sql(&self) -> &'static str;

    /// Resolve a [`defaults`] placeholder to this dialect's literal.
    fn default_variable(&self, placeholder: &str) -> Option<&'static str>;

    /// Convert a value before binding it to `column`.
    fn to_db(&self, _column: &ColumnDef, value: Value) -> Value {
        value
    }
}

/// Shared `DEFAULT ...` suffix.
pub(crate) fn default_clause(driver: &dyn Driver, column: &ColumnDef) -> Option<String> {
    column.default_value.as_deref().map(|value| {
        let resolved = driver.default_variable(value).unwrap_or(value);
        format!(" DEFAULT {resolved}")
    })
}

/// Default placeholders every dialect knows.
pub(crate) fn common_default(placeholder: &str) -> Option<&'static str> {
    match placeholder {
        defaults::NOW => Some("CURRENT_TIMESTAMP"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_embedded_quotes() {
        assert_eq!(quote_ident("Order"), "\"Order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn naming_strategies() {
        assert_eq!(NamingStrategy::Verbatim.table_name("OrderItem"), "OrderItem");
        assert_eq!(NamingStrategy::SnakeCase.table_name("OrderItem"), "order_item");
        assert_eq!(NamingStrategy::SnakeCase.column_name("firstName"), "first_name");
    }
}
