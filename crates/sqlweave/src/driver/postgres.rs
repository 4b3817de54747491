use super::{Driver, NamingStrategy, common_default, default_clause};
use crate::schema::{ColumnDef, DataType, defaults};

/// PostgreSQL dialect.
///
/// Named `$key` placeholders are not valid Postgres; bind through
/// [`BuiltStatement::to_positional`](crate::BuiltStatement::to_positional).
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    naming: NamingStrategy,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a naming strategy.
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    fn column_type(column: &ColumnDef) -> String {
        if column.auto_increment {
            return match column.data_type {
                DataType::Bigint => "BIGSERIAL".to_string(),
                DataType::Smallint => "SMALLSERIAL".to_string(),
                _ => "SERIAL".to_string(),
            };
        }

        let base = match column.data_type {
            DataType::Datetime => "TIMESTAMP",
            DataType::Timestampz => "TIMESTAMPTZ",
            DataType::Timez => "TIMETZ",
            DataType::Double => "DOUBLE PRECISION",
            DataType::Float => "REAL",
            DataType::Blob | DataType::Bytes => "BYTEA",
            DataType::Nvarchar => "VARCHAR",
            DataType::Nchar => "CHAR",
            other => other.as_str(),
        };

        match (column.data_type, column.precision, column.scale) {
            (
                DataType::Decimal | DataType::Numeric,
                Some(precision),
                Some(scale),
            ) => format!("{base}({precision},{scale})"),
            (
                DataType::Decimal
                | DataType::Numeric
                | DataType::Varchar
                | DataType::Nvarchar
                | DataType::Char
                | DataType::Nchar
                | DataType::Bit,
                Some(precision),
                _,
            ) => format!("{base}({precision})"),
            _ => base.to_string(),
        }
    }
}

impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn naming(&self) -> NamingStrategy {
        self.naming
    }

    fn pagination(&self, skip: Option<u64>, take: Option<u64>) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(take) = take {
            parts.push(format!("LIMIT {take}"));
        }
        if let Some(skip) = skip.filter(|s| *s > 0) {
            parts.push(format!("OFFSET {skip}"));
        }
        parts.join(" ")
    }

    fn column_ddl(&self, column: &ColumnDef) -> String {
        let mut sql = format!("{} {}", self.quote_column(&column.name), Self::column_type(column));
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if column.required {
            sql.push_str(" NOT NULL");
        }
        if column.unique && !column.index {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = default_clause(self, column) {
            sql.push_str(&default);
        }
        sql
    }

    fn table_names_sql(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'"
    }

    fn default_variable(&self, placeholder: &str) -> Option<&'static str> {
        match placeholder {
            defaults::MAX_TEXT | defaults::MAX_TEXT_UNICODE => Some("TEXT"),
            defaults::TRUE => Some("TRUE"),
            defaults::FALSE => Some("FALSE"),
            other => common_default(other),
        }
    }
}
