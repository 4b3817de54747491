//! Convenient imports for typical `sqlweave` usage.
//!
//! ```ignore
//! use sqlweave::prelude::*;
//! ```

pub use crate::{
    BuiltStatement, ColumnDef, DataType, DeleteQuery, Fragment, JoinKind, JoinOn, JoinSpec, Joinable,
    Refs, RowOptions, SelectQuery, Shorthand, StatementBuilder, Table, TableHandle, TableRef,
    TableSchema, UpdateQuery, Value, Weave, WeaveConfig, WeaveError, WeaveResult, raw, sql,
};
