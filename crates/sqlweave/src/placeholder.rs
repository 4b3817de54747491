//! `$key` placeholder scanning.
//!
//! Placeholders are `$` followed by either a run of digits (positional) or an
//! identifier (named). Text inside single-quoted string literals and
//! double-quoted identifiers is skipped.

use crate::params::ParamKey;

/// A placeholder occurrence in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder {
    /// Byte offset of the `$`.
    pub start: usize,
    /// Byte offset one past the last key character.
    pub end: usize,
    pub key: ParamKey,
}

/// Find every placeholder in `text`, in order.
pub(crate) fn scan(text: &str) -> Vec<Placeholder> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // doubled quote is an escape
                        if i + 1 < bytes.len() && bytes[i + 1] == quote {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'$' => {
                let start = i;
                let key_start = i + 1;
                let mut end = key_start;
                if end < bytes.len() && bytes[end].is_ascii_digit() {
                    while end < bytes.len() && bytes[end].is_ascii_digit() {
                        end += 1;
                    }
                } else if end < bytes.len() && is_ident_start(bytes[end]) {
                    while end < bytes.len() && is_ident_continue(bytes[end]) {
                        end += 1;
                    }
                }
                if end > key_start {
                    found.push(Placeholder {
                        start,
                        end,
                        key: ParamKey::parse(&text[key_start..end]),
                    });
                    i = end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    found
}

/// Rewrite placeholders in one pass.
///
/// `rename` returns the replacement key for a placeholder, or `None` to leave it.
pub(crate) fn rewrite<F>(text: &str, mut rename: F) -> String
where
    F: FnMut(&ParamKey) -> Option<String>,
{
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for p in scan(text) {
        if let Some(new_key) = rename(&p.key) {
            out.push_str(&text[last..p.start]);
            out.push('$');
            out.push_str(&new_key);
            last = p.end;
        }
    }
    out.push_str(&text[last..]);
    out
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
