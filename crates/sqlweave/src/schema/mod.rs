//! Table and column metadata.
//!
//! A [`TableSchema`] lists the properties of a logical table type in
//! declaration order. Properties backed by a [`ColumnDef`] are storage
//! columns; the rest are carried for completeness but cannot be referenced
//! in SQL. Schemas are usually produced by `#[derive(Table)]` and shared as
//! cheap [`TableHandle`]s.

mod registry;
pub mod statements;

pub use registry::SchemaRegistry;

use crate::error::{WeaveError, WeaveResult};
use crate::value::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Placeholder default values resolved per driver.
pub mod defaults {
    pub const NOW: &str = "{NOW}";
    pub const MAX_TEXT: &str = "{MAX_TEXT}";
    pub const MAX_TEXT_UNICODE: &str = "{MAX_TEXT_UNICODE}";
    pub const TRUE: &str = "{TRUE}";
    pub const FALSE: &str = "{FALSE}";
}

/// Declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Smallint,
    Bigint,
    Decimal,
    Numeric,
    Real,
    Float,
    Double,
    Money,
    Date,
    Datetime,
    Time,
    Timez,
    Timestamp,
    Timestampz,
    Interval,
    Boolean,
    Uuid,
    Blob,
    Bytes,
    Bit,
    Text,
    Varchar,
    Nvarchar,
    Char,
    Nchar,
    Json,
    Jsonb,
    Xml,
}

impl DataType {
    pub const ALL: [DataType; 29] = [
        DataType::Integer,
        DataType::Smallint,
        DataType::Bigint,
        DataType::Decimal,
        DataType::Numeric,
        DataType::Real,
        DataType::Float,
        DataType::Double,
        DataType::Money,
        DataType::Date,
        DataType::Datetime,
        DataType::Time,
        DataType::Timez,
        DataType::Timestamp,
        DataType::Timestampz,
        DataType::Interval,
        DataType::Boolean,
        DataType::Uuid,
        DataType::Blob,
        DataType::Bytes,
        DataType::Bit,
        DataType::Text,
        DataType::Varchar,
        DataType::Nvarchar,
        DataType::Char,
        DataType::Nchar,
        DataType::Json,
        DataType::Jsonb,
        DataType::Xml,
    ];

    /// The SQL spelling, e.g. `TIMESTAMPZ`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Smallint => "SMALLINT",
            DataType::Bigint => "BIGINT",
            DataType::Decimal => "DECIMAL",
            DataType::Numeric => "NUMERIC",
            DataType::Real => "REAL",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Money => "MONEY",
            DataType::Date => "DATE",
            DataType::Datetime => "DATETIME",
            DataType::Time => "TIME",
            DataType::Timez => "TIMEZ",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Timestampz => "TIMESTAMPZ",
            DataType::Interval => "INTERVAL",
            DataType::Boolean => "BOOLEAN",
            DataType::Uuid => "UUID",
            DataType::Blob => "BLOB",
            DataType::Bytes => "BYTES",
            DataType::Bit => "BIT",
            DataType::Text => "TEXT",
            DataType::Varchar => "VARCHAR",
            DataType::Nvarchar => "NVARCHAR",
            DataType::Char => "CHAR",
            DataType::Nchar => "NCHAR",
            DataType::Json => "JSON",
            DataType::Jsonb => "JSONB",
            DataType::Xml => "XML",
        }
    }

    /// Parse the SQL spelling, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }

    /// Check if values of this type are stored as date/time.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::Datetime | DataType::Timestamp | DataType::Timestampz
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name in the database (before the naming strategy).
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Rendered as `NOT NULL`.
    pub required: bool,
    pub unique: bool,
    /// Emit a separate index for this column.
    pub index: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Literal default, or one of the [`defaults`] placeholders.
    pub default_value: Option<String>,
}

impl ColumnDef {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            auto_increment: false,
            required: false,
            unique: false,
            index: false,
            precision: None,
            scale: None,
            default_value: None,
        }
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as auto-incrementing.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark as `NOT NULL`.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Create an index for this column.
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Set precision (and optionally scale), e.g. `DECIMAL(10,2)` or `VARCHAR(50)`.
    pub fn precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A property of a table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    /// `None` for properties that are not storage columns.
    pub column: Option<ColumnDef>,
}

/// Metadata for one logical table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    table_name: String,
    properties: Vec<PropertyDef>,
}

impl TableSchema {
    /// Create a schema whose table name equals its type name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table_name: name.clone(),
            name,
            properties: Vec::new(),
        }
    }

    /// Override the database table name.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Add a column whose property name equals its column name.
    pub fn column(self, column: ColumnDef) -> Self {
        let name = column.name.clone();
        self.property(name, column)
    }

    /// Add a property backed by `column`.
    pub fn property(mut self, name: impl Into<String>, column: ColumnDef) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            column: Some(column),
        });
        self
    }

    /// Add a property that is not a storage column.
    pub fn non_column(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            column: None,
        });
        self
    }

    // ==================== Lookups ====================

    /// Logical type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database table name.
    pub fn db_table_name(&self) -> &str {
        &self.table_name
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Storage columns in declaration order, with their property names.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.properties
            .iter()
            .filter_map(|p| p.column.as_ref().map(|c| (p.name.as_str(), c)))
    }

    /// Look up the column behind a property.
    ///
    /// Fails with [`WeaveError::UnknownProperty`] if the property does not
    /// exist or is not a storage column.
    pub fn column_for(&self, property: &str) -> WeaveResult<&ColumnDef> {
        self.properties
            .iter()
            .find(|p| p.name == property)
            .and_then(|p| p.column.as_ref())
            .ok_or_else(|| WeaveError::unknown_property(&self.name, property))
    }

    /// Primary key columns with their property names.
    pub fn primary_keys(&self) -> Vec<(&str, &ColumnDef)> {
        self.columns().filter(|(_, c)| c.primary_key).collect()
    }

    /// Check if a property is a storage column.
    pub fn has_column(&self, property: &str) -> bool {
        self.column_for(property).is_ok()
    }
}

/// Shared handle to a registered [`TableSchema`].
///
/// Handles compare by logical type name.
#[derive(Debug, Clone)]
pub struct TableHandle(Arc<TableSchema>);

impl TableHandle {
    pub fn new(schema: TableSchema) -> Self {
        Self(Arc::new(schema))
    }

    /// Handle for a [`Table`] type.
    pub fn of<T: Table>() -> Self {
        Self::new(T::schema())
    }

    pub fn schema(&self) -> &TableSchema {
        &self.0
    }
}

impl Deref for TableHandle {
    type Target = TableSchema;

    fn deref(&self) -> &TableSchema {
        &self.0
    }
}

impl PartialEq for TableHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for TableHandle {}

impl From<TableSchema> for TableHandle {
    fn from(schema: TableSchema) -> Self {
        Self::new(schema)
    }
}

impl From<&TableHandle> for TableHandle {
    fn from(handle: &TableHandle) -> Self {
        handle.clone()
    }
}

/// A Rust type mapped to a table.
///
/// Implemented by `#[derive(Table)]`:
///
/// ```ignore
/// #[derive(Table)]
/// #[weave(table = "Contact")]
/// struct Person {
///     #[weave(id, column = "id")]
///     key: i64,
///     #[weave(column = "firstName")]
///     name: String,
/// }
/// ```
pub trait Table {
    /// Schema of this type.
    fn schema() -> TableSchema;

    /// Current property values, keyed by property name.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Shared handle to this type's schema.
    fn table() -> TableHandle
    where
        Self: Sized,
    {
        TableHandle::of::<Self>()
    }
}
