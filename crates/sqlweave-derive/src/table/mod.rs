//! Table derive macro implementation
//!
//! - `attrs`: struct and field attribute parsing
//! - `expand`: `Table::schema()` and `Table::values()` generation

mod attrs;

use crate::common::syn_types::{option_inner, sql_type_name};
use attrs::{FieldAttr, field_attr, table_attr};
use heck::ToUpperCamelCase;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

/// Column type names understood by `sqlweave::DataType`.
const DATA_TYPES: &[&str] = &[
    "INTEGER", "SMALLINT", "BIGINT", "DECIMAL", "NUMERIC", "REAL", "FLOAT", "DOUBLE", "MONEY",
    "DATE", "DATETIME", "TIME", "TIMEZ", "TIMESTAMP", "TIMESTAMPZ", "INTERVAL", "BOOLEAN", "UUID",
    "BLOB", "BYTES", "BIT", "TEXT", "VARCHAR", "NVARCHAR", "CHAR", "NCHAR", "JSON", "JSONB", "XML",
];

struct ColumnField {
    ident: syn::Ident,
    property: String,
    column: Option<TokenStream>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let table = table_attr(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Table can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Table can only be derived for structs",
            ));
        }
    };

    let any_explicit_id = fields
        .iter()
        .map(field_attr)
        .collect::<Result<Vec<_>>>()?
        .iter()
        .any(|a| a.is_id);

    let mut columns = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attr = field_attr(field)?;
        let property = ident.to_string();
        let column = if attr.skip {
            None
        } else {
            let is_id = attr.is_id || (!any_explicit_id && property == "id");
            Some(column_def(field, &property, &attr, is_id)?)
        };
        columns.push(ColumnField {
            ident,
            property,
            column,
        });
    }

    let schema_name = table.name.unwrap_or_else(|| struct_name.to_string());
    let table_name = table.table.unwrap_or_else(|| schema_name.clone());

    let properties = columns.iter().map(|c| {
        let property = &c.property;
        match &c.column {
            Some(column) => quote! { .property(#property, #column) },
            None => quote! { .non_column(#property) },
        }
    });

    let values = columns.iter().filter(|c| c.column.is_some()).map(|c| {
        let ident = &c.ident;
        let property = &c.property;
        quote! {
            (#property, ::sqlweave::Value::from(::std::clone::Clone::clone(&self.#ident)))
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sqlweave::Table for #struct_name #ty_generics #where_clause {
            fn schema() -> ::sqlweave::TableSchema {
                ::sqlweave::TableSchema::new(#schema_name)
                    .table_name(#table_name)
                    #(#properties)*
            }

            fn values(&self) -> ::std::vec::Vec<(&'static str, ::sqlweave::Value)> {
                ::std::vec![#(#values),*]
            }
        }
    })
}

/// `ColumnDef::new(...)` with its builder calls.
fn column_def(field: &syn::Field, property: &str, attr: &FieldAttr, is_id: bool) -> Result<TokenStream> {
    let column = attr.column.clone().unwrap_or_else(|| property.to_string());
    let data_type = data_type_ident(field, attr)?;

    let mut calls = Vec::new();
    if is_id {
        calls.push(quote! { .primary_key() });
    }
    if attr.auto_increment {
        calls.push(quote! { .auto_increment() });
    }
    if attr.required || (!is_id && option_inner(&field.ty).is_none()) {
        calls.push(quote! { .required() });
    }
    if attr.unique {
        calls.push(quote! { .unique() });
    }
    if attr.index {
        calls.push(quote! { .index() });
    }
    if let Some(precision) = attr.precision {
        let scale = match attr.scale {
            Some(s) => quote! { ::std::option::Option::Some(#s) },
            None => quote! { ::std::option::Option::None },
        };
        calls.push(quote! { .precision(#precision, #scale) });
    }
    if let Some(default) = &attr.default {
        calls.push(quote! { .default_value(#default) });
    }

    Ok(quote! {
        ::sqlweave::ColumnDef::new(#column, ::sqlweave::DataType::#data_type) #(#calls)*
    })
}

fn data_type_ident(field: &syn::Field, attr: &FieldAttr) -> Result<syn::Ident> {
    let name = match &attr.ty {
        Some(lit) => {
            let name = lit.value().to_uppercase();
            if !DATA_TYPES.contains(&name.as_str()) {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("unknown column type `{}`", lit.value()),
                ));
            }
            name
        }
        None => sql_type_name(&field.ty)
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer a column type; add #[weave(ty = \"...\")]",
                )
            })?
            .to_string(),
    };
    Ok(format_ident!(
        "{}",
        name.to_lowercase().to_upper_camel_case(),
        span = Span::call_site()
    ))
}
