use super::{Driver, NamingStrategy, common_default, default_clause};
use crate::schema::{ColumnDef, DataType, defaults};
use crate::value::Value;
use chrono::SecondsFormat;

/// SQLite dialect.
#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    naming: NamingStrategy,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a naming strategy.
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Storage class for a declared type.
    fn column_type(data_type: DataType) -> &'static str {
        match data_type {
            DataType::Integer
            | DataType::Smallint
            | DataType::Bigint
            | DataType::Real
            | DataType::Double
            | DataType::Float
            | DataType::Numeric
            | DataType::Decimal
            | DataType::Boolean
            | DataType::Date
            | DataType::Datetime => data_type.as_str(),
            DataType::Interval => "INTEGER",
            DataType::Money => "NUMERIC",
            DataType::Blob | DataType::Bytes | DataType::Bit => "BLOB",
            DataType::Uuid
            | DataType::Json
            | DataType::Jsonb
            | DataType::Xml
            | DataType::Time
            | DataType::Timez
            | DataType::Timestamp
            | DataType::Timestampz => "TEXT",
            DataType::Text
            | DataType::Varchar
            | DataType::Nvarchar
            | DataType::Char
            | DataType::Nchar => data_type.as_str(),
        }
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn naming(&self) -> NamingStrategy {
        self.naming
    }

    /// `LIMIT take OFFSET skip`, `LIMIT take`, or `LIMIT -1 OFFSET skip`.
    fn pagination(&self, skip: Option<u64>, take: Option<u64>) -> String {
        match (skip.filter(|s| *s > 0), take) {
            (None, None) => String::new(),
            (Some(skip), Some(take)) => format!("LIMIT {take} OFFSET {skip}"),
            (Some(skip), None) => format!("LIMIT -1 OFFSET {skip}"),
            (None, Some(take)) => format!("LIMIT {take}"),
        }
    }

    fn column_ddl(&self, column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_column(&column.name),
            Self::column_type(column.data_type)
        );
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if column.auto_increment {
            sql.push_str(" AUTOINCREMENT");
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
        "SELECT name FROM sqlite_master WHERE type ='table' AND name NOT LIKE 'sqlite_%'"
    }

    fn default_variable(&self, placeholder: &str) -> Option<&'static str> {
        match placeholder {
            defaults::MAX_TEXT | defaults::MAX_TEXT_UNICODE => Some("TEXT"),
            defaults::TRUE => Some("1"),
            defaults::FALSE => Some("0"),
            other => common_default(other),
        }
    }

    /// Timestamps are stored as ISO-8601 text, UUIDs and JSON as text.
    fn to_db(&self, column: &ColumnDef, value: Value) -> Value {
        match value {
            Value::Timestamp(t) if column.data_type.is_temporal() => {
                Value::Text(t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Uuid(u) => Value::Text(u.to_string()),
            Value::Json(j) => Value::Text(j.to_string()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn pagination_forms() {
        let d = SqliteDriver::new();
        assert_eq!(d.pagination(None, None), "");
        assert_eq!(d.pagination(None, Some(10)), "LIMIT 10");
        assert_eq!(d.pagination(Some(0), Some(10)), "LIMIT 10");
        assert_eq!(d.pagination(Some(20), Some(10)), "LIMIT 10 OFFSET 20");
        assert_eq!(d.pagination(Some(20), None), "LIMIT -1 OFFSET 20");
    }

    #[test]
    fn column_definitions() {
        let d = SqliteDriver::new();
        let id = ColumnDef::new("id", DataType::Integer).primary_key().auto_increment();
        assert_eq!(d.column_ddl(&id), "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT");

        let created = ColumnDef::new("createdAt", DataType::Timestamp)
            .required()
            .default_value(defaults::NOW);
        assert_eq!(
            d.column_ddl(&created),
            "\"createdAt\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );

        let flag = ColumnDef::new("active", DataType::Boolean).default_value(defaults::TRUE);
        assert_eq!(d.column_ddl(&flag), "\"active\" BOOLEAN DEFAULT 1");

        let cost = ColumnDef::new("cost", DataType::Money);
        assert_eq!(d.column_ddl(&cost), "\"cost\" NUMERIC");
    }

    #[test]
    fn unique_is_skipped_for_indexed_columns() {
        let d = SqliteDriver::new();
        let email = ColumnDef::new("email", DataType::Text).unique();
        assert_eq!(d.column_ddl(&email), "\"email\" TEXT UNIQUE");
        assert_eq!(d.column_ddl(&email.index()), "\"email\" TEXT");
    }

    #[test]
    fn snake_case_naming() {
        let d = SqliteDriver::new().with_naming(NamingStrategy::SnakeCase);
        assert_eq!(d.quote_table("OrderItem"), "\"order_item\"");
        assert_eq!(d.quote_column("contactId"), "\"contact_id\"");
    }

    #[test]
    fn timestamps_become_iso_text() {
        let d = SqliteDriver::new();
        let col = ColumnDef::new("createdAt", DataType::Datetime);
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            d.to_db(&col, Value::Timestamp(t)),
            Value::Text("2024-01-02T03:04:05.000Z".into())
        );
    }
}
