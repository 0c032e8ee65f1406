//! Named query arguments.
//!
//! [`NamedArgs`] binds values to `@name` placeholders. Before a statement
//! reaches the server the placeholders are rewritten into positional
//! `$1..$n` form, which is what [`NamedArgs::rewrite`] does.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::value::SqlValue;

/// A mapping of placeholder name (without `@`) to value.
///
/// Iteration order is by name so that diagnostics are deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedArgs {
    values: BTreeMap<String, SqlValue>,
}

impl NamedArgs {
    /// Create an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, builder style.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert an argument, returning the previous value for that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Option<SqlValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Look up an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }

    /// Check whether an argument is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate arguments in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, SqlValue> {
        self.values.iter()
    }

    /// Rewrite `@name` placeholders in `sql` to positional `$n` placeholders.
    ///
    /// Placeholders are numbered in order of first appearance; a name used
    /// twice gets the same number. Names missing from the map bind `NULL`.
    /// Text inside single-quoted literals, double-quoted identifiers and
    /// `--` line comments is copied untouched, and `@@` is not a placeholder.
    #[must_use]
    pub fn rewrite(&self, sql: &str) -> (String, Vec<SqlValue>) {
        let mut out = String::with_capacity(sql.len());
        let mut order: Vec<String> = Vec::new();
        let mut chars = sql.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' | '"' => {
                    out.push(c);
                    for inner in chars.by_ref() {
                        out.push(inner);
                        if inner == c {
                            break;
                        }
                    }
                }
                '-' if chars.peek() == Some(&'-') => {
                    out.push(c);
                    for inner in chars.by_ref() {
                        out.push(inner);
                        if inner == '\n' {
                            break;
                        }
                    }
                }
                '@' => match chars.peek() {
                    Some('@') => {
                        out.push('@');
                        out.push('@');
                        chars.next();
                    }
                    Some(&next) if next.is_alphabetic() || next == '_' => {
                        let mut name = String::new();
                        while let Some(&ch) = chars.peek() {
                            if ch.is_alphanumeric() || ch == '_' {
                                name.push(ch);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        let position = match order.iter().position(|n| *n == name) {
                            Some(idx) => idx + 1,
                            None => {
                                order.push(name);
                                order.len()
                            }
                        };
                        out.push('$');
                        out.push_str(&position.to_string());
                    }
                    _ => out.push('@'),
                },
                _ => out.push(c),
            }
        }

        let values = order
            .iter()
            .map(|name| self.values.get(name).cloned().unwrap_or(SqlValue::Null))
            .collect();
        (out, values)
    }
}

impl<K, V> FromIterator<(K, V)> for NamedArgs
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NamedArgs {
    type Item = (&'a String, &'a SqlValue);
    type IntoIter = btree_map::Iter<'a, String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
