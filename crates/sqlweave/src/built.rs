//! Rendered statements.

use crate::params::{ParamKey, ParamMap};
use crate::placeholder;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use tokio_postgres::types::ToSql;

/// The output of a builder: SQL text with `$key` placeholders and the values
/// for every key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltStatement {
    pub sql: String,
    pub params: ParamMap,
}

impl BuiltStatement {
    pub fn new(sql: impl Into<String>, params: ParamMap) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Value bound under `key`.
    pub fn param(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.params.get(&key.into())
    }

    /// Renumber placeholders `$1..$n` in order of first appearance, for
    /// drivers that only bind by position. A key used several times keeps
    /// one number.
    pub fn to_positional(&self) -> PositionalStatement {
        let mut numbers: HashMap<ParamKey, usize> = HashMap::new();
        let mut values = Vec::new();
        let sql = placeholder::rewrite(&self.sql, |key| {
            if let Some(n) = numbers.get(key) {
                return Some(n.to_string());
            }
            let value = self.params.get(key)?;
            values.push(value.clone());
            numbers.insert(key.clone(), values.len());
            Some(values.len().to_string())
        });
        PositionalStatement { sql, values }
    }
}

/// A statement with `$1..$n` placeholders and values in binding order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl PositionalStatement {
    /// Parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}
