//! WHERE / HAVING condition lists.
//!
//! A [`ConditionList`] keeps rendered condition text with the conjunction
//! that joins each entry to the previous one. Conditions arrive as
//! [`Where`] inputs: fragments, raw SQL, or a [`Shorthand`] map resolved
//! against the root table's schema.

mod shorthand;

pub use shorthand::{Shorthand, ShorthandOp};

use crate::error::WeaveResult;
use crate::fragment::{self, Fragment};
use crate::params::ParameterSpace;
use crate::reference::TableRef;
use std::fmt;

/// How a condition joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition input.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// A parameterized fragment.
    Fragment(Fragment),
    /// Several fragments, each its own condition.
    Fragments(Vec<Fragment>),
    /// Literal SQL with no parameters; a `$key` placeholder in it is an
    /// [`InvalidFragment`](crate::WeaveError::InvalidFragment) error.
    Raw(String),
    /// Operator map resolved against the root table.
    Shorthand(Shorthand),
}

impl From<Fragment> for Where {
    fn from(f: Fragment) -> Self {
        Where::Fragment(f)
    }
}

impl From<Vec<Fragment>> for Where {
    fn from(f: Vec<Fragment>) -> Self {
        Where::Fragments(f)
    }
}

impl From<&str> for Where {
    fn from(sql: &str) -> Self {
        Where::Raw(sql.to_string())
    }
}

impl From<String> for Where {
    fn from(sql: String) -> Self {
        Where::Raw(sql)
    }
}

impl From<Shorthand> for Where {
    fn from(s: Shorthand) -> Self {
        Where::Shorthand(s)
    }
}

/// Ordered conditions with their conjunctions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionList {
    entries: Vec<(Conjunction, String)>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append already-rendered condition text.
    pub fn push(&mut self, conjunction: Conjunction, sql: impl Into<String>) {
        self.entries.push((conjunction, sql.into()));
    }

    /// Merge a fragment's parameters into `params` and append its text.
    pub fn push_fragment(
        &mut self,
        conjunction: Conjunction,
        fragment: Fragment,
        params: &mut ParameterSpace,
    ) {
        if fragment.is_empty() {
            return;
        }
        let sql = params.merge(fragment);
        self.push(conjunction, sql);
    }

    /// Append a condition input.
    ///
    /// Shorthand properties are resolved against `root`. A failing shorthand
    /// term or a raw input carrying a placeholder leaves both the list and
    /// `params` untouched.
    pub fn push_where(
        &mut self,
        conjunction: Conjunction,
        input: Where,
        root: &TableRef,
        params: &mut ParameterSpace,
    ) -> WeaveResult<()> {
        match input {
            Where::Fragment(fragment) => self.push_fragment(conjunction, fragment, params),
            Where::Fragments(fragments) => {
                for fragment in fragments {
                    self.push_fragment(conjunction, fragment, params);
                }
            }
            Where::Raw(sql) => {
                let sql = fragment::literal(sql)?;
                if !sql.trim().is_empty() {
                    self.push(conjunction, sql);
                }
            }
            Where::Shorthand(shorthand) => {
                for sql in shorthand.render(root, params)? {
                    self.push(conjunction, sql);
                }
            }
        }
        Ok(())
    }

    /// Remove all conditions.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Conjunction, &str)> {
        self.entries.iter().map(|(c, s)| (*c, s.as_str()))
    }

    /// `c1 <conj2> c2 ...`; the first entry's conjunction is not rendered.
    pub fn render(&self) -> String {
        let mut sql = String::new();
        for (i, (conjunction, text)) in self.entries.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(conjunction.as_str());
                sql.push(' ');
            }
            sql.push_str(text);
        }
        sql
    }

    /// ` <keyword> <conditions>`, or an empty string when there are none.
    pub fn render_clause(&self, keyword: &str) -> String {
        if self.entries.is_empty() {
            String::new()
        } else {
            format!(" {keyword} {}", self.render())
        }
    }
}
