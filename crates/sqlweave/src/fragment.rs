//! Parameterized SQL fragments.
//!
//! A [`Fragment`] is a piece of SQL text plus the parameters its `$key`
//! placeholders refer to. Fragments are built three ways:
//!
//! - the [`sql!`](crate::sql) template macro, which binds values as `$1, $2, ...`
//!   and splices column/table references as quoted text;
//! - [`Fragment::new`], a raw string with an explicit parameter map;
//! - [`Fragment::raw`], literal text with no parameters.
//!
//! Literal text never carries `$key` placeholders of its own: a placeholder
//! without a bound parameter would alias whatever the statement binds under
//! that key later, so literal inputs containing one fail with
//! [`WeaveError::InvalidFragment`].
//!
//! ```ignore
//! use sqlweave::sql;
//!
//! let f = sql!("COUNT({}) * {}", o.col("qty")?, 3)?;
//! assert_eq!(f.text(), r#"COUNT("qty") * $1"#);
//! ```

use crate::error::{WeaveError, WeaveResult};
use crate::params::{ParamKey, ParamMap, ParameterSpace};
use crate::placeholder;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A SQL text fragment and its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    text: String,
    params: ParamMap,
}

impl Fragment {
    /// Create a fragment from text and an explicit parameter map.
    ///
    /// Every `$key` in `text` must have a parameter and every parameter must be
    /// referenced, otherwise this fails with [`WeaveError::InvalidFragment`].
    pub fn new<I, K, V>(text: impl Into<String>, params: I) -> WeaveResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ParamKey>,
        V: Into<Value>,
    {
        let fragment = Self {
            text: text.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        };
        fragment.validate()?;
        Ok(fragment)
    }

    /// Create a literal fragment with no parameters.
    ///
    /// Fails with [`WeaveError::InvalidFragment`] if the text contains a
    /// `$key` placeholder.
    pub fn raw(text: impl Into<String>) -> WeaveResult<Self> {
        Ok(Self {
            text: literal(text)?,
            params: ParamMap::new(),
        })
    }

    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fragment from a `{}` template and its arguments.
    ///
    /// `{{` and `}}` are literal braces. Used by the [`sql!`](crate::sql) macro.
    /// Placeholders in the template text or in [`SqlArg::Raw`] arguments are
    /// rejected; values go through slots.
    pub fn template(template: &str, args: Vec<SqlArg>) -> WeaveResult<Self> {
        let expected = args.len();
        let mut args = args.into_iter();
        let mut fragment = Fragment::empty();
        let mut literal = String::new();
        let mut slots = 0usize;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            match (c, next) {
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    literal.push(c);
                }
                ('{', Some('}')) => {
                    chars.next();
                    slots += 1;
                    fragment.push(&literal)?;
                    literal.clear();
                    match args.next() {
                        Some(arg) => {
                            fragment.push_arg(arg)?;
                        }
                        None => {
                            return Err(WeaveError::invalid_fragment(format!(
                                "template has more slots than the {expected} argument(s) given"
                            )));
                        }
                    }
                }
                ('{' | '}', _) => {
                    return Err(WeaveError::invalid_fragment(format!(
                        "unmatched '{c}' in template; use '{c}{c}' for a literal brace"
                    )));
                }
                _ => literal.push(c),
            }
        }
        fragment.push(&literal)?;

        if slots != expected {
            return Err(WeaveError::invalid_fragment(format!(
                "template has {slots} slot(s) but {expected} argument(s) were given"
            )));
        }
        Ok(fragment)
    }

    // ==================== Incremental building ====================

    /// Append literal SQL.
    ///
    /// Fails with [`WeaveError::InvalidFragment`] if `sql` contains a `$key`
    /// placeholder; use [`push_bind`](Self::push_bind) for values.
    pub fn push(&mut self, sql: &str) -> WeaveResult<&mut Self> {
        reject_placeholders(sql)?;
        self.text.push_str(sql);
        Ok(self)
    }

    /// Append a placeholder and bind `value` under the next positional key.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        let mut space = ParameterSpace::from(std::mem::take(&mut self.params));
        let key = space.push_positional(value);
        self.params = space.into_map();
        self.text.push_str(&key.placeholder());
        self
    }

    /// Append another fragment, renumbering its positional parameters if they collide.
    pub fn push_fragment(&mut self, other: Fragment) -> &mut Self {
        let mut space = ParameterSpace::from(std::mem::take(&mut self.params));
        let text = space.merge(other);
        self.params = space.into_map();
        self.text.push_str(&text);
        self
    }

    /// Append a template argument.
    pub fn push_arg(&mut self, arg: SqlArg) -> WeaveResult<&mut Self> {
        match arg {
            SqlArg::Bind(value) => Ok(self.push_bind(value)),
            SqlArg::Raw(text) => self.push(&text),
            SqlArg::Nested(fragment) => Ok(self.push_fragment(fragment)),
            SqlArg::Omit => Ok(self),
        }
    }

    // ==================== Accessors ====================

    /// The SQL text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parameters.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Check if the fragment has no text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Split into text and parameters.
    pub fn into_parts(self) -> (String, ParamMap) {
        (self.text, self.params)
    }

    fn validate(&self) -> WeaveResult<()> {
        let referenced: BTreeSet<ParamKey> = placeholder::scan(&self.text)
            .into_iter()
            .map(|p| p.key)
            .collect();

        if let Some(missing) = referenced.iter().find(|k| !self.params.contains_key(*k)) {
            return Err(WeaveError::invalid_fragment(format!(
                "missing parameter for placeholder ${missing} in `{}`",
                self.text
            )));
        }
        if let Some(unused) = self.params.keys().find(|k| !referenced.contains(*k)) {
            return Err(WeaveError::invalid_fragment(format!(
                "parameter '{unused}' is not referenced in `{}`",
                self.text
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Accepts `{"sql": "...", "params": {...}}`.
impl TryFrom<&serde_json::Value> for Fragment {
    type Error = WeaveError;

    fn try_from(value: &serde_json::Value) -> WeaveResult<Self> {
        let received = json_kind(value);
        let object = value.as_object().ok_or_else(|| {
            WeaveError::invalid_fragment(format!(
                "expected an object with a 'sql' string, received {received}"
            ))
        })?;
        let text = object
            .get("sql")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                WeaveError::invalid_fragment("expected an object with a 'sql' string, received object")
            })?;

        match object.get("params") {
            None | Some(serde_json::Value::Null) => Fragment::new(text, Vec::<(ParamKey, Value)>::new()),
            Some(serde_json::Value::Object(params)) => Fragment::new(
                text,
                params
                    .iter()
                    .map(|(k, v)| (ParamKey::parse(k), Value::from_json(v))),
            ),
            Some(other) => Err(WeaveError::invalid_fragment(format!(
                "'params' must be an object, received {}",
                json_kind(other)
            ))),
        }
    }
}

/// Check that literal SQL carries no `$key` placeholder and return it.
pub(crate) fn literal(text: impl Into<String>) -> WeaveResult<String> {
    let text = text.into();
    reject_placeholders(&text)?;
    Ok(text)
}

fn reject_placeholders(text: &str) -> WeaveResult<()> {
    match placeholder::scan(text).first() {
        Some(p) => Err(WeaveError::invalid_fragment(format!(
            "literal SQL `{text}` contains placeholder ${}; bind values through a fragment",
            p.key
        ))),
        None => Ok(()),
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ==================== Template arguments ====================

/// One interpolated template argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    /// Bound as a new positional parameter.
    Bind(Value),
    /// Spliced verbatim.
    Raw(String),
    /// Spliced with its parameters merged.
    Nested(Fragment),
    /// Emits nothing.
    Omit,
}

/// Literal SQL text for a template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub String);

/// Wrap literal SQL text for use as a template argument.
pub fn raw(text: impl Into<String>) -> Raw {
    Raw(text.into())
}

/// Conversion into a template argument.
pub trait IntoSqlArg {
    fn into_sql_arg(self) -> SqlArg;
}

impl IntoSqlArg for SqlArg {
    fn into_sql_arg(self) -> SqlArg {
        self
    }
}

impl IntoSqlArg for Value {
    fn into_sql_arg(self) -> SqlArg {
        if self.is_null() {
            SqlArg::Omit
        } else {
            SqlArg::Bind(self)
        }
    }
}

impl IntoSqlArg for &Value {
    fn into_sql_arg(self) -> SqlArg {
        self.clone().into_sql_arg()
    }
}

macro_rules! impl_into_sql_arg_bind {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoSqlArg for $t {
                fn into_sql_arg(self) -> SqlArg {
                    SqlArg::Bind(Value::from(self))
                }
            }
        )*
    };
}

impl_into_sql_arg_bind!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    Vec<u8>,
    serde_json::Value,
    DateTime<Utc>,
    NaiveDateTime,
    Uuid,
);

impl<T: IntoSqlArg> IntoSqlArg for Option<T> {
    fn into_sql_arg(self) -> SqlArg {
        match self {
            Some(v) => v.into_sql_arg(),
            None => SqlArg::Omit,
        }
    }
}

impl IntoSqlArg for Fragment {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Nested(self)
    }
}

impl IntoSqlArg for &Fragment {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Nested(self.clone())
    }
}

impl IntoSqlArg for Raw {
    fn into_sql_arg(self) -> SqlArg {
        SqlArg::Raw(self.0)
    }
}

/// Build a [`Fragment`] from a `{}` template.
///
/// Returns `WeaveResult<Fragment>`; a slot/argument count mismatch is an
/// [`InvalidFragment`](crate::WeaveError::InvalidFragment) error.
///
/// ```ignore
/// let f = sql!("{} = {}", c.col("id")?, 42)?;
/// ```
#[macro_export]
macro_rules! sql {
    ($template:expr $(,)?) => {
        $crate::Fragment::template($template, ::std::vec::Vec::new())
    };
    ($template:expr, $($arg:expr),+ $(,)?) => {
        $crate::Fragment::template(
            $template,
            ::std::vec![$($crate::IntoSqlArg::into_sql_arg($arg)),+],
        )
    };
}
