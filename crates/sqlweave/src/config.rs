//! Assembler configuration.
//!
//! ```ignore
//! let config = WeaveConfig::new()
//!     .dialect(Dialect::Postgres)
//!     .delete_without_where(DangerousDmlPolicy::Warn);
//! let db = Weave::from_config(config);
//! ```
//!
//! The same settings can be loaded from TOML:
//!
//! ```toml
//! dialect = "postgres"
//! naming = "snake_case"
//! update_without_where = "error"
//! delete_without_where = "warn"
//! log_statements = true
//! max_logged_sql = 200
//! ```

use crate::driver::{DriverRef, NamingStrategy, PostgresDriver, SqliteDriver};
use crate::error::{WeaveError, WeaveResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// SQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

impl Dialect {
    /// A driver for this dialect.
    pub fn driver(&self, naming: NamingStrategy) -> DriverRef {
        match self {
            Dialect::Sqlite => Arc::new(SqliteDriver::new().with_naming(naming)),
            Dialect::Postgres => Arc::new(PostgresDriver::new().with_naming(naming)),
        }
    }
}

/// What to do with an UPDATE or DELETE that has no WHERE clause and was not
/// forced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerousDmlPolicy {
    Allow,
    Warn,
    #[default]
    Error,
}

/// Configuration for [`Weave`](crate::Weave).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveConfig {
    pub dialect: Dialect,
    pub naming: NamingStrategy,
    pub update_without_where: DangerousDmlPolicy,
    pub delete_without_where: DangerousDmlPolicy,
    /// Emit a `debug` event for every prepared statement.
    pub log_statements: bool,
    /// Truncate logged SQL to this many bytes.
    pub max_logged_sql: Option<usize>,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            naming: NamingStrategy::default(),
            update_without_where: DangerousDmlPolicy::default(),
            delete_without_where: DangerousDmlPolicy::default(),
            log_statements: true,
            max_logged_sql: Some(200),
        }
    }
}

impl WeaveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    pub fn update_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.update_without_where = policy;
        self
    }

    pub fn delete_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.delete_without_where = policy;
        self
    }

    /// Allow UPDATE and DELETE without WHERE.
    pub fn permissive(mut self) -> Self {
        self.update_without_where = DangerousDmlPolicy::Allow;
        self.delete_without_where = DangerousDmlPolicy::Allow;
        self
    }

    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    pub fn max_logged_sql(mut self, max: Option<usize>) -> Self {
        self.max_logged_sql = max;
        self
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> WeaveResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WeaveError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The driver described by `dialect` and `naming`.
    pub fn driver(&self) -> DriverRef {
        self.dialect.driver(self.naming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;

    #[test]
    fn test_defaults_deny_unguarded_dml() {
        let config = WeaveConfig::default();
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.update_without_where, DangerousDmlPolicy::Error);
        assert_eq!(config.delete_without_where, DangerousDmlPolicy::Error);
        assert!(config.log_statements);
        assert_eq!(config.max_logged_sql, Some(200));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WeaveConfig::from_toml_str(
            r#"
            dialect = "postgres"
            delete_without_where = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.delete_without_where, DangerousDmlPolicy::Warn);
        assert_eq!(config.update_without_where, DangerousDmlPolicy::Error);
        assert_eq!(config.driver().name(), "postgres");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = WeaveConfig::from_toml_str("dialect = \"oracle\"").unwrap_err();
        assert!(matches!(err, WeaveError::Config(_)));
    }

    #[test]
    fn test_builder_methods() {
        let config = WeaveConfig::new()
            .naming(NamingStrategy::SnakeCase)
            .permissive()
            .log_statements(false)
            .max_logged_sql(None);
        assert_eq!(config.naming, NamingStrategy::SnakeCase);
        assert_eq!(config.update_without_where, DangerousDmlPolicy::Allow);
        assert!(!config.log_statements);
        assert_eq!(config.max_logged_sql, None);
    }
}
