//! Parameter keys and the per-statement parameter space.
//!
//! A statement accumulates parameters from many fragments. Fragments number
//! their positional parameters from `$1` independently, so merging them into
//! one statement has to renumber collisions:
//!
//! ```ignore
//! let mut space = ParameterSpace::new();
//! let a = space.merge(Fragment::new("a = $1", [(1, 10)])?);
//! let b = space.merge(Fragment::new("b = $1", [(1, 20)])?);
//! assert_eq!(b, "b = $2");
//! ```

use crate::fragment::Fragment;
use crate::placeholder;
use crate::value::Value;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A parameter key: a name (`$id`) or a position (`$3`).
///
/// Positional keys order before named keys, and numerically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    Positional(u32),
    Named(String),
}

impl ParamKey {
    /// Parse a bare key. All-digit keys are positional.
    pub fn parse(key: &str) -> Self {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = key.parse::<u32>() {
                return ParamKey::Positional(n);
            }
        }
        ParamKey::Named(key.to_string())
    }

    /// Check if this is a positional key.
    pub fn is_positional(&self) -> bool {
        matches!(self, ParamKey::Positional(_))
    }

    /// The placeholder text for this key, e.g. `$id`.
    pub fn placeholder(&self) -> String {
        format!("${self}")
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Positional(n) => write!(f, "{n}"),
            ParamKey::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for ParamKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<u32> for ParamKey {
    fn from(n: u32) -> Self {
        ParamKey::Positional(n)
    }
}

impl From<&str> for ParamKey {
    fn from(key: &str) -> Self {
        ParamKey::parse(key)
    }
}

impl From<String> for ParamKey {
    fn from(key: String) -> Self {
        ParamKey::parse(&key)
    }
}

/// Parameters keyed by [`ParamKey`].
pub type ParamMap = BTreeMap<ParamKey, Value>;

/// Accumulated parameters of one statement under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpace {
    params: ParamMap,
}

impl ParameterSpace {
    /// Create an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fragment's parameters into this space and return its text,
    /// rewritten for any renumbered positional keys.
    ///
    /// For each incoming key, in order:
    /// - absent from the space: inserted unchanged;
    /// - positional and already present: moved to `1 + max positional key`;
    /// - named and already present: overwritten (last write wins).
    ///
    /// All renames are applied to the text in a single pass, so `$1 -> $2`
    /// and `$2 -> $3` in the same fragment never chain.
    pub fn merge(&mut self, fragment: Fragment) -> String {
        let (text, params) = fragment.into_parts();
        let mut renames: HashMap<ParamKey, ParamKey> = HashMap::new();

        for (key, value) in params {
            match key {
                ParamKey::Positional(n) if self.params.contains_key(&key) => {
                    let next = self.next_positional();
                    tracing::trace!(from = n, to = next, "renumbered positional parameter");
                    renames.insert(key, ParamKey::Positional(next));
                    self.params.insert(ParamKey::Positional(next), value);
                }
                key => {
                    self.params.insert(key, value);
                }
            }
        }

        if renames.is_empty() {
            text
        } else {
            placeholder::rewrite(&text, |key| renames.get(key).map(ToString::to_string))
        }
    }

    /// Bind a value under `key`, replacing any previous value.
    pub fn bind(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    /// Bind a value under a fresh positional key and return that key.
    pub fn push_positional(&mut self, value: impl Into<Value>) -> ParamKey {
        let key = ParamKey::Positional(self.next_positional());
        self.params.insert(key.clone(), value.into());
        key
    }

    /// `1 + max positional key`, or 1 when there are none.
    pub fn next_positional(&self) -> u32 {
        self.params
            .keys()
            .filter_map(|k| match k {
                ParamKey::Positional(n) => Some(*n),
                ParamKey::Named(_) => None,
            })
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Keep only the keys for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ParamKey) -> bool,
    {
        self.params.retain(|key, _| keep(key));
    }

    /// Get a bound value.
    pub fn get(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.params.get(&key.into())
    }

    /// Check whether a key is bound.
    pub fn contains(&self, key: impl Into<ParamKey>) -> bool {
        self.params.contains_key(&key.into())
    }

    /// Get the number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over bound parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.params.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &ParamMap {
        &self.params
    }

    /// Take the underlying map.
    pub fn into_map(self) -> ParamMap {
        self.params
    }
}

impl From<ParamMap> for ParameterSpace {
    fn from(params: ParamMap) -> Self {
        Self { params }
    }
}
