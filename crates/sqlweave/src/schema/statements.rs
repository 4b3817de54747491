//! Whole-table and single-row statements generated from a schema.
//!
//! Row statements bind each value under its property name (`$firstName`)
//! after the driver's [`to_db`](Driver::to_db) conversion.

use super::{ColumnDef, TableSchema};
use crate::built::BuiltStatement;
use crate::driver::Driver;
use crate::error::{WeaveError, WeaveResult};
use crate::params::{ParamKey, ParamMap};
use crate::value::Value;

/// Which properties of a row take part in a row statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOptions {
    only_props: Option<Vec<String>>,
    only_with_values: bool,
    force: bool,
}

impl RowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only write these properties.
    pub fn only_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    /// Skip properties whose value is null.
    pub fn only_with_values(mut self) -> Self {
        self.only_with_values = true;
        self
    }

    /// Allow UPDATE/DELETE on a table without a primary key.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }
}

/// `CREATE TABLE` followed by one `CREATE INDEX` per indexed column.
pub fn create_table(schema: &TableSchema, driver: &dyn Driver) -> String {
    let columns = schema
        .columns()
        .map(|(_, c)| driver.column_ddl(c))
        .collect::<Vec<_>>()
        .join(",\n    ");
    let mut sql = format!(
        "CREATE TABLE {} (\n    {columns}\n);\n",
        driver.quote_table(schema.db_table_name())
    );
    let indexes = schema
        .columns()
        .filter(|(_, c)| c.index)
        .map(|(_, c)| format!("{};", driver.index_ddl(schema, c)))
        .collect::<Vec<_>>();
    sql.push_str(&indexes.join("\n"));
    sql
}

pub fn drop_table(schema: &TableSchema, driver: &dyn Driver) -> String {
    format!(
        "DROP TABLE IF EXISTS {}",
        driver.quote_table(schema.db_table_name())
    )
}

/// `INSERT INTO <table> (<columns>) VALUES ($<props>)`, skipping
/// auto-increment columns. A row with nothing left to insert renders
/// `DEFAULT VALUES`.
pub fn insert(
    schema: &TableSchema,
    driver: &dyn Driver,
    values: Vec<(&str, Value)>,
    options: &RowOptions,
) -> WeaveResult<BuiltStatement> {
    let row = RowValues::new(schema, values, options)?;
    let mut params = ParamMap::new();
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();

    for (prop, column) in row.selected() {
        if column.auto_increment {
            continue;
        }
        columns.push(driver.quote_column(&column.name));
        placeholders.push(bind(&mut params, driver, prop, column, row.value(prop)));
    }

    let table = driver.quote_table(schema.db_table_name());
    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES")
    } else {
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        )
    };
    Ok(BuiltStatement::new(sql, params))
}

/// `UPDATE <table> SET <non-key columns> WHERE <primary key>`.
///
/// The primary key is always matched, even when `only_props` leaves it out.
pub fn update(
    schema: &TableSchema,
    driver: &dyn Driver,
    values: Vec<(&str, Value)>,
    options: &RowOptions,
) -> WeaveResult<BuiltStatement> {
    let row = RowValues::new(schema, values, options)?;
    let mut params = ParamMap::new();

    let assignments = row
        .selected()
        .filter(|(_, c)| !c.primary_key)
        .map(|(prop, column)| {
            let placeholder = bind(&mut params, driver, prop, column, row.value(prop));
            format!("{} = {placeholder}", driver.quote_column(&column.name))
        })
        .collect::<Vec<_>>();
    if assignments.is_empty() {
        return Err(WeaveError::EmptyAssignment {
            table: schema.name().to_string(),
        });
    }

    let mut sql = format!(
        "UPDATE {} SET {}",
        driver.quote_table(schema.db_table_name()),
        assignments.join(", ")
    );
    push_key_guard(&mut sql, "UPDATE", schema, driver, &row, &mut params, options)?;
    Ok(BuiltStatement::new(sql, params))
}

/// `DELETE FROM <table> WHERE <primary key>`.
pub fn delete(
    schema: &TableSchema,
    driver: &dyn Driver,
    values: Vec<(&str, Value)>,
    options: &RowOptions,
) -> WeaveResult<BuiltStatement> {
    let row = RowValues::new(schema, values, options)?;
    let mut params = ParamMap::new();
    let mut sql = format!("DELETE FROM {}", driver.quote_table(schema.db_table_name()));
    push_key_guard(&mut sql, "DELETE", schema, driver, &row, &mut params, options)?;
    Ok(BuiltStatement::new(sql, params))
}

fn push_key_guard(
    sql: &mut String,
    statement: &'static str,
    schema: &TableSchema,
    driver: &dyn Driver,
    row: &RowValues<'_>,
    params: &mut ParamMap,
    options: &RowOptions,
) -> WeaveResult<()> {
    let keys = schema.primary_keys();
    if keys.is_empty() {
        if options.force {
            return Ok(());
        }
        return Err(WeaveError::missing_guard(statement, schema.name()));
    }
    let conditions = keys
        .into_iter()
        .map(|(prop, column)| {
            let placeholder = bind(params, driver, prop, column, row.value(prop));
            format!("{} = {placeholder}", driver.quote_column(&column.name))
        })
        .collect::<Vec<_>>();
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    Ok(())
}

fn bind(
    params: &mut ParamMap,
    driver: &dyn Driver,
    prop: &str,
    column: &ColumnDef,
    value: Value,
) -> String {
    let key = ParamKey::from(prop);
    let placeholder = key.placeholder();
    params.insert(key, driver.to_db(column, value));
    placeholder
}

/// A row's values matched against its schema.
struct RowValues<'a> {
    schema: &'a TableSchema,
    values: Vec<(&'a str, Value)>,
    only_props: Option<&'a [String]>,
    only_with_values: bool,
}

impl<'a> RowValues<'a> {
    fn new(
        schema: &'a TableSchema,
        values: Vec<(&'a str, Value)>,
        options: &'a RowOptions,
    ) -> WeaveResult<Self> {
        if let Some(props) = &options.only_props {
            for prop in props {
                schema.column_for(prop)?;
            }
        }
        Ok(Self {
            schema,
            values,
            only_props: options.only_props.as_deref(),
            only_with_values: options.only_with_values,
        })
    }

    /// Value of `prop`, or null when the row does not carry it.
    fn value(&self, prop: &str) -> Value {
        self.values
            .iter()
            .find(|(p, _)| *p == prop)
            .map_or(Value::Null, |(_, v)| v.clone())
    }

    /// Storage columns taking part in the statement.
    fn selected(&self) -> impl Iterator<Item = (&'a str, &'a ColumnDef)> + '_ {
        self.schema.columns().filter(move |(prop, _)| {
            let listed = self
                .only_props
                .is_none_or(|only| only.iter().any(|p| p == prop));
            listed && (!self.only_with_values || !self.value(prop).is_null())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{PostgresDriver, SqliteDriver};
    use crate::schema::fixtures::*;
    use crate::schema::{ColumnDef, DataType, TableSchema};

    fn contact_row() -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(1)),
            ("firstName", Value::from("John")),
            ("lastName", Value::from("Doe")),
            ("age", Value::Int(27)),
            ("email", Value::from("john@doe.org")),
            ("phone", Value::Null),
        ]
    }

    #[test]
    fn test_create_table_with_index() {
        let sql = create_table(&order_item(), &SqliteDriver::new());
        assert_eq!(
            sql,
            "CREATE TABLE \"OrderItem\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \"orderId\" INTEGER NOT NULL,\n    \"name\" TEXT NOT NULL\n);\n"
        );

        let sql = create_table(&contact(), &SqliteDriver::new());
        assert!(sql.contains("\"email\" TEXT NOT NULL,\n"));
        assert!(sql.ends_with(
            ");\nCREATE UNIQUE INDEX idx_Contact_email ON \"Contact\" (\"email\");"
        ));
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            drop_table(&person(), &PostgresDriver::new()),
            "DROP TABLE IF EXISTS \"Contact\""
        );
    }

    #[test]
    fn test_insert_skips_auto_increment() {
        let row = vec![
            ("id", Value::Int(9)),
            ("orderId", Value::Int(2)),
            ("name", Value::from("pen")),
        ];
        let built = insert(&order_item(), &SqliteDriver::new(), row, &RowOptions::new()).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"OrderItem\" (\"orderId\", \"name\") VALUES ($orderId, $name)"
        );
        assert_eq!(built.param("orderId"), Some(&Value::Int(2)));
        assert_eq!(built.param("id"), None);
    }

    #[test]
    fn test_insert_only_auto_increment_uses_defaults() {
        let counter = TableSchema::new("Counter")
            .column(ColumnDef::new("id", DataType::Integer).primary_key().auto_increment());
        let built = insert(
            &counter,
            &SqliteDriver::new(),
            vec![("id", Value::Int(4))],
            &RowOptions::new(),
        )
        .unwrap();
        assert_eq!(built.sql, "INSERT INTO \"Counter\" DEFAULT VALUES");
        assert!(built.params.is_empty());
    }

    #[test]
    fn test_insert_only_with_values() {
        let built = insert(
            &contact(),
            &SqliteDriver::new(),
            contact_row(),
            &RowOptions::new().only_with_values(),
        )
        .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"Contact\" (\"firstName\", \"lastName\", \"age\", \"email\") VALUES ($firstName, $lastName, $age, $email)"
        );
    }

    #[test]
    fn test_update_by_primary_key() {
        let built = update(
            &contact(),
            &SqliteDriver::new(),
            contact_row(),
            &RowOptions::new().only_props(["age"]),
        )
        .unwrap();
        assert_eq!(built.sql, "UPDATE \"Contact\" SET \"age\" = $age WHERE \"id\" = $id");
        assert_eq!(built.param("id"), Some(&Value::Int(1)));
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_update_uses_mapped_columns() {
        let built = update(
            &person(),
            &SqliteDriver::new(),
            vec![("key", Value::Int(3)), ("name", Value::from("Jo"))],
            &RowOptions::new().only_props(["name"]),
        )
        .unwrap();
        assert_eq!(
            built.sql,
            "UPDATE \"Contact\" SET \"firstName\" = $name WHERE \"id\" = $key"
        );
    }

    #[test]
    fn test_update_without_key_needs_force() {
        let row = vec![("event", Value::from("login")), ("at", Value::Null)];
        let err = update(&audit(), &SqliteDriver::new(), row.clone(), &RowOptions::new())
            .unwrap_err();
        assert_eq!(err, WeaveError::missing_guard("UPDATE", "Audit"));

        let built = update(&audit(), &SqliteDriver::new(), row, &RowOptions::new().force())
            .unwrap();
        assert_eq!(built.sql, "UPDATE \"Audit\" SET \"event\" = $event, \"at\" = $at");
    }

    #[test]
    fn test_update_with_nothing_to_set() {
        let err = update(
            &contact(),
            &SqliteDriver::new(),
            contact_row(),
            &RowOptions::new().only_props(["id"]),
        )
        .unwrap_err();
        assert!(matches!(err, WeaveError::EmptyAssignment { .. }));
    }

    #[test]
    fn test_unknown_only_prop() {
        let err = insert(
            &contact(),
            &SqliteDriver::new(),
            contact_row(),
            &RowOptions::new().only_props(["nope"]),
        )
        .unwrap_err();
        assert!(err.is_unknown_property());
    }

    #[test]
    fn test_delete_by_primary_key() {
        let built = delete(&contact(), &SqliteDriver::new(), contact_row(), &RowOptions::new())
            .unwrap();
        assert_eq!(built.sql, "DELETE FROM \"Contact\" WHERE \"id\" = $id");
        assert_eq!(built.params.len(), 1);

        let err = delete(&audit(), &SqliteDriver::new(), vec![], &RowOptions::new()).unwrap_err();
        assert!(err.is_missing_guard());
    }
}
