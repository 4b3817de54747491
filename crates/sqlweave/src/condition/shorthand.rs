use crate::error::{WeaveError, WeaveResult};
use crate::fragment::json_kind;
use crate::params::{ParamKey, ParameterSpace};
use crate::reference::TableRef;
use crate::value::Value;

/// Comparison operator of a shorthand term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShorthandOp {
    Equals,
    NotEquals,
    Like,
    NotLike,
    /// `LIKE 'value%'`
    StartsWith,
    /// `LIKE '%value'`
    EndsWith,
    /// `LIKE '%value%'`
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Caller-supplied SQL operator.
    Custom(String),
}

impl ShorthandOp {
    /// Operator for a JSON key, e.g. `"startsWith"`.
    pub fn from_key(key: &str) -> Option<Self> {
        let op = match key {
            "equals" | "eq" | "=" => ShorthandOp::Equals,
            "notEquals" | "notEq" | "!=" | "<>" => ShorthandOp::NotEquals,
            "like" => ShorthandOp::Like,
            "notLike" => ShorthandOp::NotLike,
            "startsWith" => ShorthandOp::StartsWith,
            "endsWith" => ShorthandOp::EndsWith,
            "contains" => ShorthandOp::Contains,
            "gt" | ">" => ShorthandOp::Gt,
            "gte" | ">=" => ShorthandOp::Gte,
            "lt" | "<" => ShorthandOp::Lt,
            "lte" | "<=" => ShorthandOp::Lte,
            _ => return None,
        };
        Some(op)
    }

    /// The SQL operator.
    pub fn sql(&self) -> &str {
        match self {
            ShorthandOp::Equals => "=",
            ShorthandOp::NotEquals => "<>",
            ShorthandOp::Like | ShorthandOp::StartsWith | ShorthandOp::EndsWith | ShorthandOp::Contains => {
                "LIKE"
            }
            ShorthandOp::NotLike => "NOT LIKE",
            ShorthandOp::Gt => ">",
            ShorthandOp::Gte => ">=",
            ShorthandOp::Lt => "<",
            ShorthandOp::Lte => "<=",
            ShorthandOp::Custom(op) => op,
        }
    }

    fn bound_value(&self, property: &str, value: &Value) -> WeaveResult<Value> {
        let (prefix, suffix) = match self {
            ShorthandOp::StartsWith => ("", "%"),
            ShorthandOp::EndsWith => ("%", ""),
            ShorthandOp::Contains => ("%", "%"),
            _ => return Ok(value.clone()),
        };
        let text = value.as_pattern_text().ok_or_else(|| {
            WeaveError::invalid_shorthand(format!(
                "'{property}' needs a text value for a LIKE pattern, received {}",
                value.kind()
            ))
        })?;
        Ok(Value::Text(format!("{prefix}{text}{suffix}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Compare {
        op: ShorthandOp,
        property: String,
        value: Value,
    },
    List {
        negated: bool,
        property: String,
        values: Vec<Value>,
    },
    Null {
        negated: bool,
        property: String,
    },
}

impl Term {
    fn property(&self) -> &str {
        match self {
            Term::Compare { property, .. } | Term::List { property, .. } | Term::Null { property, .. } => {
                property
            }
        }
    }
}

/// Resolved term waiting for its parameters to be bound.
enum Staged {
    Compare {
        column: String,
        op: String,
        key: ParamKey,
        value: Value,
    },
    List {
        column: String,
        negated: bool,
        values: Vec<Value>,
    },
    Null {
        column: String,
        negated: bool,
    },
}

/// Operator-keyed condition map.
///
/// Each term renders `<quotedColumn> <op> $<property>` and binds its value
/// under the property's named key. Lists render as freshly numbered
/// positional parameters.
///
/// ```ignore
/// let filter = Shorthand::new()
///     .equals("id", 1)
///     .starts_with("city", "Aus")
///     .is_null(["phone"]);
/// db.from(&contact).filter(filter)?;
/// // WHERE "id" = $id AND "city" LIKE $city AND "phone" IS NULL
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shorthand {
    terms: Vec<Term>,
}

impl Shorthand {
    pub fn new() -> Self {
        Self::default()
    }

    fn compare(mut self, op: ShorthandOp, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push(Term::Compare {
            op,
            property: property.into(),
            value: value.into(),
        });
        self
    }

    /// `<col> = $prop`
    pub fn equals(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Equals, property, value)
    }

    /// `<col> <> $prop`
    pub fn not_equals(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::NotEquals, property, value)
    }

    pub fn like(self, property: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Like, property, pattern)
    }

    pub fn not_like(self, property: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::NotLike, property, pattern)
    }

    pub fn starts_with(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::StartsWith, property, value)
    }

    pub fn ends_with(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::EndsWith, property, value)
    }

    pub fn contains(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Contains, property, value)
    }

    pub fn gt(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Gt, property, value)
    }

    pub fn gte(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Gte, property, value)
    }

    pub fn lt(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Lt, property, value)
    }

    pub fn lte(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(ShorthandOp::Lte, property, value)
    }

    /// Arbitrary operator applied to each `(property, value)` pair.
    pub fn op<I, K, V>(mut self, sql_op: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let op = ShorthandOp::Custom(sql_op.into());
        for (property, value) in values {
            self = self.compare(op.clone(), property, value);
        }
        self
    }

    /// `<col> IN ($n,$m,...)`
    pub fn in_list<I, V>(mut self, property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.terms.push(Term::List {
            negated: false,
            property: property.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// `<col> NOT IN ($n,$m,...)`
    pub fn not_in<I, V>(mut self, property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.terms.push(Term::List {
            negated: true,
            property: property.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// `<col> IS NULL` for each property.
    pub fn is_null<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for property in properties {
            self.terms.push(Term::Null {
                negated: false,
                property: property.into(),
            });
        }
        self
    }

    /// `<col> IS NOT NULL` for each property.
    pub fn not_null<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for property in properties {
            self.terms.push(Term::Null {
                negated: true,
                property: property.into(),
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Render every term, binding parameters into `params`.
    ///
    /// All terms are resolved before anything is bound.
    pub(crate) fn render(&self, root: &TableRef, params: &mut ParameterSpace) -> WeaveResult<Vec<String>> {
        let mut staged = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            let column = root.col(term.property())?.unqualified();
            staged.push(match term {
                Term::Compare {
                    op,
                    property,
                    value,
                } => Staged::Compare {
                    column,
                    op: op.sql().to_string(),
                    key: ParamKey::Named(property.clone()),
                    value: op.bound_value(property, value)?,
                },
                Term::List {
                    negated, values, ..
                } => Staged::List {
                    column,
                    negated: *negated,
                    values: values.clone(),
                },
                Term::Null { negated, .. } => Staged::Null {
                    column,
                    negated: *negated,
                },
            });
        }

        let rendered = staged
            .into_iter()
            .map(|s| match s {
                Staged::Compare {
                    column,
                    op,
                    key,
                    value,
                } => {
                    let placeholder = key.placeholder();
                    params.bind(key, value);
                    format!("{column} {op} {placeholder}")
                }
                Staged::List {
                    negated, values, ..
                } if values.is_empty() => {
                    // empty IN never matches, empty NOT IN always does
                    let constant = if negated { "1=1" } else { "1=0" };
                    constant.to_string()
                }
                Staged::List {
                    column,
                    negated,
                    values,
                } => {
                    let placeholders: Vec<String> = values
                        .into_iter()
                        .map(|v| params.push_positional(v).placeholder())
                        .collect();
                    let keyword = if negated { "NOT IN" } else { "IN" };
                    format!("{column} {keyword} ({})", placeholders.join(","))
                }
                Staged::Null { column, negated } => {
                    let keyword = if negated { "IS NOT NULL" } else { "IS NULL" };
                    format!("{column} {keyword}")
                }
            })
            .collect();
        Ok(rendered)
    }
}

// ==================== JSON input ====================

/// Accepts an operator map such as
/// `{"equals": {"id": 1}, "in": {"age": [18, 21]}, "isNull": ["phone"], "op": [">", {"qty": 3}]}`.
/// Operators and their columns render in document order.
impl TryFrom<&serde_json::Value> for Shorthand {
    type Error = WeaveError;

    fn try_from(value: &serde_json::Value) -> WeaveResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            WeaveError::invalid_shorthand(format!(
                "expected an object of operators, received {}",
                json_kind(value)
            ))
        })?;

        let mut shorthand = Shorthand::new();
        for (key, payload) in object {
            shorthand = match key.as_str() {
                "isNull" | "notNull" => {
                    let properties = property_names(key, payload)?;
                    if key == "isNull" {
                        shorthand.is_null(properties)
                    } else {
                        shorthand.not_null(properties)
                    }
                }
                "in" | "notIn" => {
                    let mut s = shorthand;
                    for (property, list) in property_map(key, payload)? {
                        let values: Vec<Value> = list
                            .as_array()
                            .ok_or_else(|| {
                                WeaveError::invalid_shorthand(format!(
                                    "{key} requires an array for '{property}', received {}",
                                    json_kind(list)
                                ))
                            })?
                            .iter()
                            .map(Value::from_json)
                            .collect();
                        s = if key == "in" {
                            s.in_list(property.as_str(), values)
                        } else {
                            s.not_in(property.as_str(), values)
                        };
                    }
                    s
                }
                "op" => {
                    let (sql_op, values) = match payload.as_array().map(Vec::as_slice) {
                        Some([serde_json::Value::String(op), values]) => (op.clone(), values),
                        _ => {
                            return Err(WeaveError::invalid_shorthand(format!(
                                "op requires [sqlOp, {{...}}], received {}",
                                json_kind(payload)
                            )));
                        }
                    };
                    let pairs: Vec<(String, Value)> = property_map("op", values)?
                        .map(|(k, v)| (k.clone(), Value::from_json(v)))
                        .collect();
                    shorthand.op(sql_op, pairs)
                }
                other => {
                    let op = ShorthandOp::from_key(other).ok_or_else(|| {
                        WeaveError::invalid_shorthand(format!("unknown operator '{other}'"))
                    })?;
                    let mut s = shorthand;
                    for (property, v) in property_map(key, payload)? {
                        s = s.compare(op.clone(), property.as_str(), Value::from_json(v));
                    }
                    s
                }
            };
        }
        Ok(shorthand)
    }
}

fn property_map<'a>(
    key: &str,
    payload: &'a serde_json::Value,
) -> WeaveResult<impl Iterator<Item = (&'a String, &'a serde_json::Value)>> {
    payload.as_object().map(|m| m.iter()).ok_or_else(|| {
        WeaveError::invalid_shorthand(format!(
            "{key} requires an object of property values, received {}",
            json_kind(payload)
        ))
    })
}

fn property_names(key: &str, payload: &serde_json::Value) -> WeaveResult<Vec<String>> {
    let items = payload.as_array().ok_or_else(|| {
        WeaveError::invalid_shorthand(format!(
            "{key} requires an array of property names, received {}",
            json_kind(payload)
        ))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                WeaveError::invalid_shorthand(format!(
                    "{key} property names must be strings, received {}",
                    json_kind(item)
                ))
            })
        })
        .collect()
}
