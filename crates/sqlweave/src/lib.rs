//! # sqlweave
//!
//! Composable SQL fragments and statement builders.
//!
//! ## Features
//!
//! - **Fragments**: SQL text plus its own parameter map, built with [`sql!`]
//! - **Collision-free merging**: positional parameters are renumbered when
//!   fragments are combined, named parameters are last-write-wins
//! - **Schema-aware references**: columns are resolved through table schemas
//!   and qualified by the alias of their table occurrence
//! - **Copy-on-join**: joining returns a new builder, the original stays usable
//! - **Safe defaults**: UPDATE/DELETE without WHERE are rejected unless forced
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let db = Weave::sqlite();
//! let (order, contact) = (Order::table(), Contact::table());
//!
//! let q = db
//!     .from(&order)
//!     .join(&contact, JoinOn::expr(|o, c, _| {
//!         sql!("{} = {}", o.col("contactId")?, c.col("id")?)
//!     }))?
//!     .filter(Shorthand::new().equals("freightId", 2))?
//!     .select_with(|refs| sql!("COUNT({}) as count", refs.root().col("qty")?))?;
//!
//! let stmt = db.prepare(&q)?;
//! // SELECT COUNT("Order"."qty") as count FROM "Order"
//! //   JOIN "Contact" ON "Order"."contactId" = "Contact"."id"
//! //   WHERE "freightId" = $freightId
//! ```

pub mod builder;
pub mod built;
pub mod condition;
pub mod config;
pub mod driver;
pub mod error;
pub mod fragment;
pub mod join;
pub mod params;
mod placeholder;
pub mod prelude;
pub mod reference;
pub mod schema;
pub mod value;
pub mod weave;

pub use builder::{
    DeleteQuery, Joinable, SelectQuery, StatementBuilder, StatementCore, StatementKind, UpdateQuery,
};
pub use built::{BuiltStatement, PositionalStatement};
pub use condition::{ConditionList, Conjunction, Shorthand, ShorthandOp, Where};
pub use config::{DangerousDmlPolicy, Dialect, WeaveConfig};
pub use driver::{Driver, DriverRef, NamingStrategy, PostgresDriver, SqliteDriver};
pub use error::{WeaveError, WeaveResult};
pub use fragment::{Fragment, IntoSqlArg, Raw, SqlArg, raw};
pub use join::{JoinClause, JoinKind, JoinOn, JoinPlan, JoinSpec};
pub use params::{ParamKey, ParamMap, ParameterSpace};
pub use reference::{ColumnRef, Refs, TableRef};
pub use schema::statements::RowOptions;
pub use schema::{ColumnDef, DataType, PropertyDef, SchemaRegistry, Table, TableHandle, TableSchema, defaults};
pub use value::Value;
pub use weave::Weave;

#[cfg(feature = "derive")]
pub use sqlweave_derive::Table;
