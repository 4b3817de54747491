//! Attribute parsing for the Table derive macro.
//!
//! Handles struct-level and field-level `#[weave(...)]` attributes.

use syn::ext::IdentExt;
use syn::{DeriveInput, Result};

/// Struct-level options.
#[derive(Default)]
pub(super) struct TableAttr {
    pub table: Option<String>,
    pub name: Option<String>,
}

/// Field-level options.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub auto_increment: bool,
    pub required: bool,
    pub unique: bool,
    pub index: bool,
    pub skip: bool,
    pub column: Option<String>,
    pub ty: Option<syn::LitStr>,
    pub default: Option<String>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl syn::parse::Parse for TableAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = TableAttr::default();
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            if ident == "table" {
                attr.table = Some(value.value());
            } else if ident == "name" {
                attr.name = Some(value.value());
            } else {
                return Err(syn::Error::new_spanned(
                    ident,
                    "expected `table = \"...\"` or `name = \"...\"`",
                ));
            }
            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        // Parse comma-separated flags or key = value pairs
        while !input.is_empty() {
            let ident = syn::Ident::parse_any(input)?;
            let key = ident.to_string();

            if !input.peek(syn::Token![=]) {
                match key.as_str() {
                    "id" => attr.is_id = true,
                    "auto_increment" => attr.auto_increment = true,
                    "required" => attr.required = true,
                    "unique" => attr.unique = true,
                    "index" => attr.index = true,
                    "skip" => attr.skip = true,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            ident,
                            format!("unknown weave flag `{key}`"),
                        ));
                    }
                }
            } else {
                let _: syn::Token![=] = input.parse()?;
                match key.as_str() {
                    "column" => attr.column = Some(input.parse::<syn::LitStr>()?.value()),
                    "ty" => attr.ty = Some(input.parse()?),
                    "default" => attr.default = Some(input.parse::<syn::LitStr>()?.value()),
                    "precision" => attr.precision = Some(input.parse::<syn::LitInt>()?.base10_parse()?),
                    "scale" => attr.scale = Some(input.parse::<syn::LitInt>()?.base10_parse()?),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            ident,
                            format!("unknown weave option `{key}`"),
                        ));
                    }
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

/// Merge every struct-level `#[weave(...)]` attribute.
pub(super) fn table_attr(input: &DeriveInput) -> Result<TableAttr> {
    let mut merged = TableAttr::default();
    for attr in &input.attrs {
        if attr.path().is_ident("weave") {
            let parsed: TableAttr = attr.parse_args()?;
            merged.table = parsed.table.or(merged.table);
            merged.name = parsed.name.or(merged.name);
        }
    }
    Ok(merged)
}

/// Merge every `#[weave(...)]` attribute on a field.
pub(super) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("weave") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.auto_increment |= parsed.auto_increment;
        merged.required |= parsed.required;
        merged.unique |= parsed.unique;
        merged.index |= parsed.index;
        merged.skip |= parsed.skip;
        merged.column = parsed.column.or(merged.column);
        merged.ty = parsed.ty.or(merged.ty);
        merged.default = parsed.default.or(merged.default);
        merged.precision = parsed.precision.or(merged.precision);
        merged.scale = parsed.scale.or(merged.scale);
    }
    Ok(merged)
}
