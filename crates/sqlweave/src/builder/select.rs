use super::{Joinable, StatementBuilder, StatementCore, StatementKind};
use crate::built::BuiltStatement;
use crate::condition::{ConditionList, Conjunction, Where};
use crate::driver::DriverRef;
use crate::error::WeaveResult;
use crate::fragment::{self, Fragment};
use crate::reference::Refs;
use crate::schema::TableHandle;

/// SELECT statement builder.
///
/// Without an explicit projection every storage column of the root table is
/// selected, quoted and unqualified.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    core: StatementCore,
    projection: Vec<String>,
    group_by: Vec<String>,
    having: ConditionList,
    order_by: Vec<String>,
    skip: Option<u64>,
    take: Option<u64>,
}

impl SelectQuery {
    pub fn new(table: &TableHandle, driver: DriverRef) -> Self {
        Self {
            core: StatementCore::new(table, driver),
            projection: Vec::new(),
            group_by: Vec::new(),
            having: ConditionList::new(),
            order_by: Vec::new(),
            skip: None,
            take: None,
        }
    }

    // ==================== Projection ====================

    /// Add a projection expression.
    pub fn select(mut self, fragment: Fragment) -> Self {
        if !fragment.is_empty() {
            let sql = self.core.merge(fragment);
            self.projection.push(sql);
        }
        self
    }

    /// Add a literal projection expression.
    ///
    /// Literal text must not contain `$key` placeholders.
    pub fn select_raw(mut self, sql: impl Into<String>) -> WeaveResult<Self> {
        self.projection.push(fragment::literal(sql)?);
        Ok(self)
    }

    /// Add several literal projection expressions; nothing is added if one
    /// of them contains a placeholder.
    pub fn select_columns<I, S>(mut self, columns: I) -> WeaveResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(fragment::literal)
            .collect::<WeaveResult<Vec<_>>>()?;
        self.projection.extend(columns);
        Ok(self)
    }

    /// Project root-table properties as qualified columns.
    pub fn select_props<I, S>(mut self, props: I) -> WeaveResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = self.core.root();
        let columns = props
            .into_iter()
            .map(|p| root.col(p.as_ref()).map(|c| c.to_string()))
            .collect::<WeaveResult<Vec<_>>>()?;
        self.projection.extend(columns);
        Ok(self)
    }

    /// Add a projection built from the statement's references.
    pub fn select_with<F>(self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        let fragment = f(self.core.refs())?;
        Ok(self.select(fragment))
    }

    /// Drop the projection, going back to all root columns, along with the
    /// parameters only the projection used.
    pub fn clear_select(mut self) -> Self {
        self.projection.clear();
        self.prune_params();
        self
    }

    pub fn has_select(&self) -> bool {
        !self.projection.is_empty()
    }

    // ==================== Grouping and ordering ====================

    pub fn group_by(mut self, sql: impl Into<String>) -> WeaveResult<Self> {
        self.group_by.push(fragment::literal(sql)?);
        Ok(self)
    }

    /// Group by root-table properties.
    pub fn group_by_props<I, S>(mut self, props: I) -> WeaveResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = self.core.root();
        let columns = props
            .into_iter()
            .map(|p| root.col(p.as_ref()).map(|c| c.to_string()))
            .collect::<WeaveResult<Vec<_>>>()?;
        self.group_by.extend(columns);
        Ok(self)
    }

    /// Append a HAVING condition with AND.
    pub fn having(mut self, condition: impl Into<Where>) -> WeaveResult<Self> {
        self.core
            .push_condition(&mut self.having, Conjunction::And, condition.into())?;
        Ok(self)
    }

    pub fn having_with<F>(mut self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        let fragment = f(self.core.refs())?;
        self.having
            .push_fragment(Conjunction::And, fragment, self.core.params_mut());
        Ok(self)
    }

    pub fn order_by(mut self, sql: impl Into<String>) -> WeaveResult<Self> {
        self.order_by.push(fragment::literal(sql)?);
        Ok(self)
    }

    pub fn order_by_with<F>(mut self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        let fragment = f(self.core.refs())?;
        if !fragment.is_empty() {
            let sql = self.core.merge(fragment);
            self.order_by.push(sql);
        }
        Ok(self)
    }

    // ==================== Pagination ====================

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn limit(self, skip: u64, take: u64) -> Self {
        self.skip(skip).take(take)
    }

    /// The driver's pagination clause for the current skip/take, or an
    /// empty string.
    pub fn limit_clause(&self) -> String {
        self.core.driver().pagination(self.skip, self.take)
    }

    /// [`build`](StatementBuilder::build) followed by the pagination clause.
    pub fn build_paginated(&self) -> BuiltStatement {
        let mut built = self.build();
        let limit = self.limit_clause();
        if !limit.is_empty() {
            built.sql.push(' ');
            built.sql.push_str(&limit);
        }
        built
    }

    fn projection_sql(&self) -> String {
        if !self.projection.is_empty() {
            return self.projection.join(", ");
        }
        let root = self.core.root();
        root.table()
            .columns()
            .map(|(_, column)| root.driver().quote_column(&column.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl StatementBuilder for SelectQuery {
    fn core(&self) -> &StatementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StatementCore {
        &mut self.core
    }

    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }

    fn build_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.projection_sql(),
            self.core.root().table_expr()
        );
        sql.push_str(&self.core.joins().render());
        sql.push_str(&self.core.where_clause());
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        sql.push_str(&self.having.render_clause("HAVING"));
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        sql
    }
}

impl Joinable for SelectQuery {}
