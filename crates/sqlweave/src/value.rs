//! Bound parameter values.
//!
//! [`Value`] is the owned, clone-friendly value stored in fragments and
//! parameter spaces. It serializes with serde for named-parameter drivers and
//! implements [`ToSql`] so positional statements can be handed straight to
//! tokio-postgres.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, WrongType, to_sql_checked};
use uuid::Uuid;

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    /// Check if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Text form of a scalar value, for LIKE patterns.
    ///
    /// Returns `None` for null, bytes and JSON values.
    pub fn as_pattern_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Timestamp(t) => Some(t.to_rfc3339()),
            Value::Uuid(u) => Some(u.to_string()),
            Value::Null | Value::Bytes(_) | Value::Json(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(j) => write!(f, "{j}"),
            other => match other.as_pattern_text() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

// ==================== Conversions ====================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl Value {
    /// Convert a JSON scalar into the matching variant.
    ///
    /// Objects and arrays stay as [`Value::Json`].
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Json(other.clone()),
        }
    }
}

// ==================== Postgres binding ====================

type BindResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// Encode through `T`, refusing column types `T` does not accept.
fn bind<T: ToSql>(v: &T, ty: &Type, out: &mut BytesMut) -> BindResult {
    if !T::accepts(ty) {
        return Err(Box::new(WrongType::new::<T>(ty.clone())));
    }
    v.to_sql(ty, out)
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> BindResult {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => bind(v, ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    bind(&i16::try_from(*v)?, ty, out)
                } else if *ty == Type::INT4 {
                    bind(&i32::try_from(*v)?, ty, out)
                } else if *ty == Type::FLOAT8 {
                    bind(&(*v as f64), ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    bind(&v.to_string(), ty, out)
                } else {
                    bind(v, ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    bind(&(*v as f32), ty, out)
                } else {
                    bind(v, ty, out)
                }
            }
            Value::Text(v) => bind(v, ty, out),
            Value::Bytes(v) => bind(v, ty, out),
            Value::Json(v) => bind(v, ty, out),
            Value::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    bind(&v.naive_utc(), ty, out)
                } else {
                    bind(v, ty, out)
                }
            }
            Value::Uuid(v) => bind(v, ty, out),
        }
    }

    /// Any type some variant can encode; the variant itself is checked in
    /// [`to_sql`](ToSql::to_sql).
    fn accepts(ty: &Type) -> bool {
        <bool as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i64 as ToSql>::accepts(ty)
            || <f32 as ToSql>::accepts(ty)
            || <f64 as ToSql>::accepts(ty)
            || <String as ToSql>::accepts(ty)
            || <Vec<u8> as ToSql>::accepts(ty)
            || <serde_json::Value as ToSql>::accepts(ty)
            || <NaiveDateTime as ToSql>::accepts(ty)
            || <DateTime<Utc> as ToSql>::accepts(ty)
            || <Uuid as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}
