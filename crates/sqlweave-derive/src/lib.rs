//! Derive macros for sqlweave
//!
//! Provides `#[derive(Table)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod table;

/// Derive the `sqlweave::Table` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlweave::Table;
///
/// #[derive(Table)]
/// #[weave(table = "Contact")]
/// struct Person {
///     #[weave(id, auto_increment, column = "id")]
///     key: i64,
///     #[weave(column = "firstName")]
///     name: String,
///     #[weave(unique, index)]
///     email: Option<String>,
///     #[weave(skip)]
///     display: String,
/// }
/// ```
///
/// # Attributes
///
/// Struct:
/// - `#[weave(table = "name")]` - Database table name (default: struct name)
/// - `#[weave(name = "Name")]` - Logical schema name (default: struct name)
///
/// Field:
/// - `id` - Primary key (a field named `id` is the primary key by default)
/// - `auto_increment`, `required`, `unique`, `index` - Column flags
/// - `column = "name"` - Column name (default: field name)
/// - `ty = "VARCHAR"` - Column type (default: inferred from the Rust type)
/// - `precision = 10`, `scale = 2` - Type precision
/// - `default = "{NOW}"` - Column default
/// - `skip` - Property without a storage column
///
/// Non-`Option` fields are `NOT NULL`.
#[proc_macro_derive(Table, attributes(weave))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
