use super::{Table, TableHandle, TableSchema};
use crate::error::{WeaveError, WeaveResult};
use std::collections::HashMap;

/// Registry of table schemas, keyed by logical type name.
///
/// Built once at startup and then used to resolve tables by name, e.g. for
/// filters that arrive as JSON.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableHandle>,
}

impl SchemaRegistry {
    /// Create a new empty schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`Table`] type and return its handle.
    pub fn register<T: Table>(&mut self) -> TableHandle {
        self.register_schema(T::schema())
    }

    /// Register a schema and return its handle.
    ///
    /// Registering the same name again replaces the previous schema.
    pub fn register_schema(&mut self, schema: TableSchema) -> TableHandle {
        let handle = TableHandle::new(schema);
        self.tables.insert(handle.name().to_string(), handle.clone());
        handle
    }

    /// Get a table by logical name.
    pub fn get(&self, name: &str) -> WeaveResult<TableHandle> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| WeaveError::UnknownTable(name.to_string()))
    }

    /// Check if a table is registered.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Get the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over registered tables.
    pub fn tables(&self) -> impl Iterator<Item = &TableHandle> {
        self.tables.values()
    }
}
