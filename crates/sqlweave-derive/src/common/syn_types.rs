//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let seg = last_segment(ty)?;
    if seg.ident != "Option" {
        return None;
    }
    single_type_arg(seg)
}

/// Column type name inferred from a Rust type, e.g. `i64` -> `BIGINT`.
///
/// `Option<T>` is looked through.
pub fn sql_type_name(ty: &syn::Type) -> Option<&'static str> {
    let ty = option_inner(ty).unwrap_or(ty);
    if let syn::Type::Reference(r) = ty {
        return sql_type_name(&r.elem);
    }
    let seg = last_segment(ty)?;
    let name = match seg.ident.to_string().as_str() {
        "i8" | "i16" | "u8" => "SMALLINT",
        "i32" | "u16" => "INTEGER",
        "i64" | "u32" => "BIGINT",
        "f32" => "REAL",
        "f64" => "DOUBLE",
        "bool" => "BOOLEAN",
        "String" | "str" => "TEXT",
        "DateTime" => "TIMESTAMP",
        "NaiveDateTime" => "DATETIME",
        "Uuid" => "UUID",
        "Value" | "JsonValue" => "JSON",
        "Vec" => {
            let inner = single_type_arg(seg)?;
            return (last_segment(inner)?.ident == "u8").then_some("BLOB");
        }
        _ => return None,
    };
    Some(name)
}

fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    type_path.path.segments.last()
}

fn single_type_arg(seg: &syn::PathSegment) -> Option<&syn::Type> {
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}
