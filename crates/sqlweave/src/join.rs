//! JOIN clauses.
//!
//! A [`JoinPlan`] is the ordered list of rendered join clauses of one
//! statement. ON conditions come from a [`JoinOn`] input, or from a
//! pre-built multi-table [`JoinSpec`].

use crate::error::WeaveResult;
use crate::fragment::Fragment;
use crate::reference::TableRef;
use crate::schema::TableHandle;
use std::fmt;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// One rendered join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub kind: JoinKind,
    /// Quoted table name.
    pub table: String,
    pub alias: Option<String>,
    pub on: Option<String>,
}

impl JoinClause {
    /// ` <KIND> <table>[ <alias>][ ON <on>]`
    pub fn render(&self) -> String {
        let mut sql = format!(" {} {}", self.kind.keyword(), self.table);
        if let Some(alias) = self.alias.as_deref().filter(|a| *a != self.table) {
            sql.push(' ');
            sql.push_str(alias);
        }
        if let Some(on) = self.on.as_deref().filter(|on| !on.is_empty()) {
            sql.push_str(" ON ");
            sql.push_str(on);
        }
        sql
    }
}

/// Joins of a statement, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    clauses: Vec<JoinClause>,
}

impl JoinPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: JoinClause) {
        self.clauses.push(clause);
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinClause> {
        self.clauses.iter()
    }

    pub fn render(&self) -> String {
        self.clauses.iter().map(JoinClause::render).collect()
    }
}

/// ON-expression builder: `(prev, new, root)`.
///
/// `prev` is the most recently joined table (the root for the first join),
/// `new` is the table being joined.
pub type JoinExpr = Box<dyn FnOnce(&TableRef, &TableRef, &TableRef) -> WeaveResult<Fragment>>;

/// ON condition of a join.
pub enum JoinOn {
    /// No ON clause (e.g. `CROSS JOIN`).
    None,
    /// Literal SQL.
    Raw(String),
    /// Parameterized SQL with its own parameters.
    Params(Fragment),
    /// Built from the join's table references.
    Expr(JoinExpr),
}

impl JoinOn {
    pub fn raw(sql: impl Into<String>) -> Self {
        JoinOn::Raw(sql.into())
    }

    pub fn params(fragment: Fragment) -> Self {
        JoinOn::Params(fragment)
    }

    pub fn expr<F>(f: F) -> Self
    where
        F: FnOnce(&TableRef, &TableRef, &TableRef) -> WeaveResult<Fragment> + 'static,
    {
        JoinOn::Expr(Box::new(f))
    }
}

impl From<Fragment> for JoinOn {
    fn from(fragment: Fragment) -> Self {
        JoinOn::Params(fragment)
    }
}

impl fmt::Debug for JoinOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinOn::None => f.write_str("None"),
            JoinOn::Raw(sql) => f.debug_tuple("Raw").field(sql).finish(),
            JoinOn::Params(fragment) => f.debug_tuple("Params").field(fragment).finish(),
            JoinOn::Expr(_) => f.write_str("Expr(<fn>)"),
        }
    }
}

/// ON builder of a [`JoinSpec`]: receives the target reference followed by
/// the companion references.
pub type JoinSpecExpr = Box<dyn FnOnce(&[TableRef]) -> WeaveResult<Fragment>>;

/// A reusable join to `target`, whose ON condition may reference other
/// tables already in the statement.
///
/// ```ignore
/// let item = JoinSpec::new(&order_item)
///     .with(&order)
///     .alias("i")
///     .on(|refs| sql!("{} = {}", refs[0].col("orderId")?, refs[1].col("id")?));
/// let q = db.from(&contact).join(&order, on_contact)?.join_spec(JoinKind::Left, item)?;
/// ```
pub struct JoinSpec {
    target: TableHandle,
    companions: Vec<TableHandle>,
    alias: Option<String>,
    on: Option<JoinSpecExpr>,
}

impl JoinSpec {
    pub fn new(target: &TableHandle) -> Self {
        Self {
            target: target.clone(),
            companions: Vec::new(),
            alias: None,
            on: None,
        }
    }

    /// Make another table's reference available to the ON builder.
    pub fn with(mut self, table: &TableHandle) -> Self {
        self.companions.push(table.clone());
        self
    }

    /// Alias for the joined table.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// ON builder.
    pub fn on<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&[TableRef]) -> WeaveResult<Fragment> + 'static,
    {
        self.on = Some(Box::new(f));
        self
    }

    pub fn target(&self) -> &TableHandle {
        &self.target
    }

    pub(crate) fn into_parts(
        self,
    ) -> (TableHandle, Vec<TableHandle>, Option<String>, Option<JoinSpecExpr>) {
        (self.target, self.companions, self.alias, self.on)
    }
}

impl fmt::Debug for JoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinSpec")
            .field("target", &self.target.name())
            .field("companions", &self.companions.len())
            .field("alias", &self.alias)
            .field("on", &self.on.is_some())
            .finish()
    }
}
