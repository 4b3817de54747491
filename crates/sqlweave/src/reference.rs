//! Table and column references.
//!
//! A [`TableRef`] is one occurrence of a table inside a statement, with the
//! alias that qualifies its columns. Expression closures receive references
//! and interpolate them into [`sql!`](crate::sql) templates:
//!
//! ```ignore
//! db.from(&order).join(&contact, JoinOn::expr(|o, c, _| {
//!     sql!("{} = {}", o.col("contactId")?, c.col("id")?)
//! }))?;
//! // JOIN "Contact" ON "Order"."contactId" = "Contact"."id"
//! ```

use crate::driver::DriverRef;
use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{IntoSqlArg, SqlArg};
use crate::schema::{ColumnDef, Table, TableHandle};
use std::fmt;
use std::ops::Index;

/// One occurrence of a table in a statement.
#[derive(Debug, Clone)]
pub struct TableRef {
    table: TableHandle,
    alias: Option<String>,
    driver: DriverRef,
}

impl TableRef {
    pub(crate) fn new(table: TableHandle, alias: Option<String>, driver: DriverRef) -> Self {
        Self {
            table,
            alias,
            driver,
        }
    }

    pub fn table(&self) -> &TableHandle {
        &self.table
    }

    /// The qualifier used for this reference's columns, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    /// The quoted database table name.
    pub fn quoted_table(&self) -> String {
        self.driver.quote_table(self.table.db_table_name())
    }

    /// `<quotedTable>[ <alias>]`, omitting an alias equal to the quoted name.
    pub fn table_expr(&self) -> String {
        let quoted = self.quoted_table();
        match self.alias.as_deref() {
            Some(alias) if alias != quoted => format!("{quoted} {alias}"),
            _ => quoted,
        }
    }

    /// Reference a column by property name.
    pub fn col(&self, property: &str) -> WeaveResult<ColumnRef<'_>> {
        let (property, column) = self
            .table
            .properties()
            .iter()
            .find(|p| p.name == property)
            .and_then(|p| p.column.as_ref().map(|c| (p.name.as_str(), c)))
            .ok_or_else(|| WeaveError::unknown_property(self.table.name(), property))?;
        Ok(ColumnRef {
            table: self,
            property,
            column,
        })
    }

    /// Check if this reference is to `table`.
    pub fn is(&self, table: &TableHandle) -> bool {
        &self.table == table
    }
}

/// Renders as the table expression, e.g. `"OrderItem" i`.
impl IntoSqlArg for &TableRef {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Raw(self.table_expr())
    }
}

/// A column of a [`TableRef`]; renders as `<alias>.<quotedColumn>` or `<quotedColumn>`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'a> {
    table: &'a TableRef,
    property: &'a str,
    column: &'a ColumnDef,
}

impl<'a> ColumnRef<'a> {
    pub fn property(&self) -> &'a str {
        self.property
    }

    pub fn column(&self) -> &'a ColumnDef {
        self.column
    }

    pub fn table_ref(&self) -> &'a TableRef {
        self.table
    }

    /// The quoted column name without qualifier.
    pub fn unqualified(&self) -> String {
        self.table.driver.quote_column(&self.column.name)
    }
}

impl fmt::Display for ColumnRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.alias() {
            Some(alias) => write!(f, "{alias}.{}", self.unqualified()),
            None => f.write_str(&self.unqualified()),
        }
    }
}

impl IntoSqlArg for ColumnRef<'_> {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Raw(self.to_string())
    }
}

impl IntoSqlArg for &ColumnRef<'_> {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Raw(self.to_string())
    }
}

/// All table references of a statement; the root table comes first.
#[derive(Debug, Clone)]
pub struct Refs {
    items: Vec<TableRef>,
}

impl Refs {
    pub(crate) fn new(root: TableRef) -> Self {
        Self { items: vec![root] }
    }

    pub(crate) fn push(&mut self, table_ref: TableRef) {
        self.items.push(table_ref);
    }

    pub(crate) fn root_mut(&mut self) -> &mut TableRef {
        &mut self.items[0]
    }

    /// The statement's primary table.
    pub fn root(&self) -> &TableRef {
        &self.items[0]
    }

    /// The most recently added reference.
    pub fn last(&self) -> &TableRef {
        self.items.last().unwrap_or(&self.items[0])
    }

    pub fn get(&self, index: usize) -> Option<&TableRef> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; a statement has at least its root table.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRef> {
        self.items.iter()
    }

    /// The first reference to `table`, if it is part of the statement.
    pub fn find(&self, table: &TableHandle) -> Option<&TableRef> {
        self.items.iter().find(|r| r.is(table))
    }

    /// The first reference to `table`.
    ///
    /// Fails with [`WeaveError::ReferenceNotFound`] if the table is not part
    /// of the statement.
    pub fn of(&self, table: &TableHandle) -> WeaveResult<&TableRef> {
        self.find(table)
            .ok_or_else(|| WeaveError::reference_not_found(table.name()))
    }

    /// References for several tables, in the order given.
    pub fn of_many(&self, tables: &[&TableHandle]) -> WeaveResult<Vec<&TableRef>> {
        tables.iter().map(|t| self.of(t)).collect()
    }

    /// The first reference to a [`Table`] type.
    pub fn of_type<T: Table>(&self) -> WeaveResult<&TableRef> {
        let schema = T::schema();
        self.items
            .iter()
            .find(|r| r.table.name() == schema.name())
            .ok_or_else(|| WeaveError::reference_not_found(schema.name()))
    }

    /// The reference with an explicit alias.
    pub fn of_alias(&self, alias: &str) -> Option<&TableRef> {
        self.items.iter().find(|r| r.alias() == Some(alias))
    }
}

impl Index<usize> for Refs {
    type Output = TableRef;

    fn index(&self, index: usize) -> &TableRef {
        &self.items[index]
    }
}
