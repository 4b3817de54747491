//! Statement builders.
//!
//! [`SelectQuery`], [`UpdateQuery`] and [`DeleteQuery`] share a
//! [`StatementCore`] (table references, parameter space, WHERE list and join
//! plan) and the provided methods of [`StatementBuilder`]. Only SELECT renders
//! joins, so only [`SelectQuery`] implements [`Joinable`].
//!
//! Every call that introduces SQL text merges its fragment into the
//! statement's parameter space right away, so the stored clause text always
//! uses the final placeholder names. Clearing a clause drops the parameters
//! no remaining clause refers to. `join*` calls return a copy, leaving the
//! builder they were called on usable on its own.

mod delete;
mod select;
mod update;

pub use delete::DeleteQuery;
pub use select::SelectQuery;
pub use update::UpdateQuery;

use crate::built::BuiltStatement;
use crate::condition::{ConditionList, Conjunction, Where};
use crate::driver::DriverRef;
use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{self, Fragment};
use crate::join::{JoinClause, JoinKind, JoinOn, JoinPlan, JoinSpec};
use crate::params::ParameterSpace;
use crate::placeholder;
use crate::reference::{Refs, TableRef};
use crate::schema::TableHandle;
use std::collections::BTreeSet;
use std::fmt;

/// Statement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by all statement kinds.
#[derive(Debug, Clone)]
pub struct StatementCore {
    driver: DriverRef,
    refs: Refs,
    params: ParameterSpace,
    conditions: ConditionList,
    joins: JoinPlan,
}

impl StatementCore {
    pub(crate) fn new(table: &TableHandle, driver: DriverRef) -> Self {
        let root = TableRef::new(table.clone(), None, driver.clone());
        Self {
            driver,
            refs: Refs::new(root),
            params: ParameterSpace::new(),
            conditions: ConditionList::new(),
            joins: JoinPlan::new(),
        }
    }

    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn root(&self) -> &TableRef {
        self.refs.root()
    }

    pub fn params(&self) -> &ParameterSpace {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut ParameterSpace {
        &mut self.params
    }

    pub fn conditions(&self) -> &ConditionList {
        &self.conditions
    }

    pub fn joins(&self) -> &JoinPlan {
        &self.joins
    }

    /// Merge a fragment into the parameter space, returning its final text.
    pub(crate) fn merge(&mut self, fragment: Fragment) -> String {
        self.params.merge(fragment)
    }

    pub(crate) fn set_alias(&mut self, alias: String) {
        self.refs.root_mut().set_alias(alias);
    }

    pub(crate) fn push_where(&mut self, conjunction: Conjunction, input: Where) -> WeaveResult<()> {
        self.conditions
            .push_where(conjunction, input, self.refs.root(), &mut self.params)
    }

    /// Append a condition input to a list other than WHERE (e.g. HAVING).
    pub(crate) fn push_condition(
        &mut self,
        list: &mut ConditionList,
        conjunction: Conjunction,
        input: Where,
    ) -> WeaveResult<()> {
        list.push_where(conjunction, input, self.refs.root(), &mut self.params)
    }

    pub(crate) fn push_where_with<F>(&mut self, conjunction: Conjunction, f: F) -> WeaveResult<()>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        let fragment = f(&self.refs)?;
        self.conditions
            .push_fragment(conjunction, fragment, &mut self.params);
        Ok(())
    }

    pub(crate) fn clear_where(&mut self) {
        self.conditions.clear();
    }

    /// Drop parameters whose placeholder no longer appears in `sql`.
    pub(crate) fn retain_referenced(&mut self, sql: &str) {
        let referenced: BTreeSet<_> = placeholder::scan(sql).into_iter().map(|p| p.key).collect();
        self.params.retain(|key| referenced.contains(key));
    }

    /// ` WHERE ...` or nothing.
    pub(crate) fn where_clause(&self) -> String {
        self.conditions.render_clause("WHERE")
    }

    /// Add `table` to the references and the join plan.
    ///
    /// The root reference takes its quoted table name as alias on the first
    /// join unless it already has one.
    pub(crate) fn push_join(
        &mut self,
        kind: JoinKind,
        table: &TableHandle,
        alias: Option<String>,
        on: JoinOn,
    ) -> WeaveResult<()> {
        self.qualify_root();
        let prev = self.refs.len() - 1;
        let new_ref = self.new_ref(table, alias);

        let on = match on {
            JoinOn::None => None,
            JoinOn::Raw(sql) => Some(fragment::literal(sql)?),
            JoinOn::Params(fragment) => Some(self.params.merge(fragment)),
            JoinOn::Expr(f) => {
                let fragment = f(&self.refs[prev], &new_ref, self.refs.root())?;
                Some(self.params.merge(fragment))
            }
        };

        self.finish_join(kind, new_ref, on);
        Ok(())
    }

    /// Apply a [`JoinSpec`]; its companions must already be part of the
    /// statement.
    pub(crate) fn push_join_spec(&mut self, kind: JoinKind, spec: JoinSpec) -> WeaveResult<()> {
        let (target, companions, alias, on) = spec.into_parts();
        let on = on.ok_or_else(|| WeaveError::IncompleteJoin {
            table: target.name().to_string(),
        })?;

        self.qualify_root();
        let new_ref = self.new_ref(&target, alias);

        let mut refs = Vec::with_capacity(companions.len() + 1);
        refs.push(new_ref.clone());
        for companion in &companions {
            refs.push(self.refs.of(companion)?.clone());
        }

        let fragment = on(&refs)?;
        let on = self.params.merge(fragment);
        self.finish_join(kind, new_ref, Some(on));
        Ok(())
    }

    fn qualify_root(&mut self) {
        if self.refs.root().alias().is_none() {
            let quoted = self.refs.root().quoted_table();
            self.refs.root_mut().set_alias(quoted);
        }
    }

    fn new_ref(&self, table: &TableHandle, alias: Option<String>) -> TableRef {
        let mut table_ref = TableRef::new(table.clone(), None, self.driver.clone());
        let alias = alias.unwrap_or_else(|| table_ref.quoted_table());
        table_ref.set_alias(alias);
        table_ref
    }

    fn finish_join(&mut self, kind: JoinKind, table_ref: TableRef, on: Option<String>) {
        self.joins.push(JoinClause {
            kind,
            table: table_ref.quoted_table(),
            alias: table_ref.alias().map(String::from),
            on,
        });
        self.refs.push(table_ref);
    }
}

/// Behavior shared by the statement builders.
///
/// WHERE methods take any [`Where`] input: a [`Fragment`], several
/// fragments, raw SQL, or a [`Shorthand`](crate::Shorthand) map. The
/// `*_with` forms take a closure over the statement's [`Refs`].
pub trait StatementBuilder: Clone {
    fn core(&self) -> &StatementCore;

    fn core_mut(&mut self) -> &mut StatementCore;

    fn kind(&self) -> StatementKind;

    /// Render the SQL text.
    fn build_sql(&self) -> String;

    /// Whether the statement may run without a WHERE clause.
    fn is_forced(&self) -> bool {
        false
    }

    /// Check that the statement is complete enough to run.
    fn validate(&self) -> WeaveResult<()> {
        Ok(())
    }

    /// Render the statement and its parameters.
    fn build(&self) -> BuiltStatement {
        BuiltStatement::new(self.build_sql(), self.core().params().as_map().clone())
    }

    fn refs(&self) -> &Refs {
        self.core().refs()
    }

    fn params(&self) -> &ParameterSpace {
        self.core().params()
    }

    /// The statement's primary table.
    fn table(&self) -> &TableHandle {
        self.core().root().table()
    }

    fn has_where(&self) -> bool {
        !self.core().conditions().is_empty()
    }

    /// Set an explicit alias for the root table. Call it before any join or
    /// condition that should use it.
    fn alias(mut self, alias: impl Into<String>) -> Self {
        self.core_mut().set_alias(alias.into());
        self
    }

    /// Append a condition with AND.
    fn filter(mut self, condition: impl Into<Where>) -> WeaveResult<Self> {
        self.core_mut()
            .push_where(Conjunction::And, condition.into())?;
        Ok(self)
    }

    /// Same as [`filter`](Self::filter).
    fn and(self, condition: impl Into<Where>) -> WeaveResult<Self> {
        self.filter(condition)
    }

    /// Append a condition with OR.
    fn or(mut self, condition: impl Into<Where>) -> WeaveResult<Self> {
        self.core_mut()
            .push_where(Conjunction::Or, condition.into())?;
        Ok(self)
    }

    fn filter_with<F>(mut self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        self.core_mut().push_where_with(Conjunction::And, f)?;
        Ok(self)
    }

    fn and_with<F>(self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        self.filter_with(f)
    }

    fn or_with<F>(mut self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        self.core_mut().push_where_with(Conjunction::Or, f)?;
        Ok(self)
    }

    /// Remove all WHERE conditions and the parameters only they used.
    fn clear_where(mut self) -> Self {
        self.core_mut().clear_where();
        self.prune_params();
        self
    }

    /// Drop parameters the rendered statement no longer refers to.
    fn prune_params(&mut self) {
        let sql = self.build_sql();
        self.core_mut().retain_referenced(&sql);
    }
}

/// JOIN methods, for statements that render joins.
///
/// ```compile_fail
/// use sqlweave::{ColumnDef, DataType, JoinOn, Joinable, TableHandle, TableSchema, Weave};
///
/// let t: TableHandle = TableSchema::new("T")
///     .column(ColumnDef::new("id", DataType::Integer))
///     .into();
/// let db = Weave::sqlite();
/// // UPDATE does not render joins
/// let _ = db.update(&t).join(&t, JoinOn::raw("1 = 1"));
/// ```
pub trait Joinable: StatementBuilder {
    /// A copy of this statement with `table` inner-joined.
    fn join(&self, table: &TableHandle, on: JoinOn) -> WeaveResult<Self> {
        joined(self, JoinKind::Inner, table, None, on)
    }

    fn left_join(&self, table: &TableHandle, on: JoinOn) -> WeaveResult<Self> {
        joined(self, JoinKind::Left, table, None, on)
    }

    fn right_join(&self, table: &TableHandle, on: JoinOn) -> WeaveResult<Self> {
        joined(self, JoinKind::Right, table, None, on)
    }

    fn full_join(&self, table: &TableHandle, on: JoinOn) -> WeaveResult<Self> {
        joined(self, JoinKind::Full, table, None, on)
    }

    fn cross_join(&self, table: &TableHandle) -> WeaveResult<Self> {
        joined(self, JoinKind::Cross, table, None, JoinOn::None)
    }

    /// A copy of this statement with `table` joined under `alias`.
    fn join_as(
        &self,
        kind: JoinKind,
        table: &TableHandle,
        alias: impl Into<String>,
        on: JoinOn,
    ) -> WeaveResult<Self> {
        joined(self, kind, table, Some(alias.into()), on)
    }

    /// A copy of this statement with a pre-built [`JoinSpec`] applied.
    fn join_spec(&self, kind: JoinKind, spec: JoinSpec) -> WeaveResult<Self> {
        let mut next = self.clone();
        next.core_mut().push_join_spec(kind, spec)?;
        Ok(next)
    }
}

fn joined<B: StatementBuilder>(
    builder: &B,
    kind: JoinKind,
    table: &TableHandle,
    alias: Option<String>,
    on: JoinOn,
) -> WeaveResult<B> {
    let mut next = builder.clone();
    next.core_mut().push_join(kind, table, alias, on)?;
    Ok(next)
}

#[cfg(test)]
mod tests;
