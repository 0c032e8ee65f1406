//! Call arguments and argument comparison.
//!
//! Observed calls carry [`Arg`]s; expectations declare [`ArgMatcher`]s. An
//! [`ArgsComparator`] decides whether an observed argument list satisfies
//! the declared one. [`DefaultComparator`] implements these rules:
//!
//! - No declared arguments means the call must supply none, rewriting
//!   arguments included.
//! - Positional lists must have the same length; each position is compared
//!   with deep structural equality unless the matcher is a wildcard
//!   ([`any_arg`], [`any_of`]) or a custom [`Argument`].
//! - A single declared [`ArgMatcher::Named`] against a single observed
//!   [`Arg::Named`] is compared key by key: every declared key must be
//!   present and match. Extra observed keys are ignored.
//! - A single observed rewriting argument ([`Arg::Named`] or
//!   [`Arg::Rewriter`]) is rewritten against the call's SQL, and the
//!   resulting positional values are compared. A declared
//!   [`ArgMatcher::Rewriter`] is rewritten against the same SQL first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sqlmock_types::{NamedArgs, SqlValue, ValueKind};
use thiserror::Error;

use crate::rewrite::{QueryRewriter, RewriteError};

/// One argument of an observed call.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A plain positional value.
    Value(SqlValue),
    /// Named arguments bound to `@name` placeholders.
    Named(NamedArgs),
    /// An argument that rewrites the statement it is passed with.
    Rewriter(Arc<dyn QueryRewriter>),
}

impl Arg {
    /// Wrap a [`QueryRewriter`].
    pub fn rewriter(rewriter: impl QueryRewriter + 'static) -> Self {
        Self::Rewriter(Arc::new(rewriter))
    }

    /// Rewrite `sql` if this argument is a rewriting one.
    pub(crate) fn rewrite(
        &self,
        sql: &str,
    ) -> Option<Result<(String, Vec<SqlValue>), RewriteError>> {
        match self {
            Self::Value(_) => None,
            Self::Named(named) => Some(named.rewrite_query(sql)),
            Self::Rewriter(rewriter) => Some(rewriter.rewrite_query(sql)),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Named(named) => {
                f.write_str("{")?;
                for (i, (k, v)) in named.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Rewriter(rewriter) => write!(f, "{rewriter:?}"),
        }
    }
}

/// A user-supplied predicate over a single argument value.
pub trait Argument: Send + Sync + fmt::Debug {
    /// Check whether `value` is acceptable.
    fn matches(&self, value: &SqlValue) -> bool;
}

/// One declared argument of an expectation.
#[derive(Debug, Clone)]
pub enum ArgMatcher {
    /// Deep equality with this value.
    Value(SqlValue),
    /// Any value at all.
    Any,
    /// Any value of one kind.
    AnyOf(ValueKind),
    /// Key-by-key matching of named arguments.
    Named(BTreeMap<String, ArgMatcher>),
    /// Rewritten together with the observed rewriter and compared
    /// positionally.
    Rewriter(Arc<dyn QueryRewriter>),
    /// A custom predicate.
    Custom(Arc<dyn Argument>),
}

impl ArgMatcher {
    fn matches_value(&self, value: &SqlValue) -> bool {
        match self {
            Self::Value(expected) => expected == value,
            Self::Any => true,
            Self::AnyOf(kind) => value.kind() == *kind,
            Self::Custom(argument) => argument.matches(value),
            Self::Named(_) | Self::Rewriter(_) => false,
        }
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Any => f.write_str("<any>"),
            Self::AnyOf(kind) => write!(f, "<any {kind}>"),
            Self::Named(entries) => {
                f.write_str("{")?;
                for (i, (k, m)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {m}")?;
                }
                f.write_str("}")
            }
            Self::Rewriter(rewriter) => write!(f, "{rewriter:?}"),
            Self::Custom(argument) => write!(f, "{argument:?}"),
        }
    }
}

/// Wildcard matching any argument value.
#[must_use]
pub fn any_arg() -> ArgMatcher {
    ArgMatcher::Any
}

/// Wildcard matching any argument value of `kind`.
#[must_use]
pub fn any_of(kind: ValueKind) -> ArgMatcher {
    ArgMatcher::AnyOf(kind)
}

/// Named argument matcher built from `(name, matcher)` pairs.
pub fn named<I, K, M>(entries: I) -> ArgMatcher
where
    I: IntoIterator<Item = (K, M)>,
    K: Into<String>,
    M: Into<ArgMatcher>,
{
    ArgMatcher::Named(
        entries
            .into_iter()
            .map(|(k, m)| (k.into(), m.into()))
            .collect(),
    )
}

/// Matcher delegating to a custom [`Argument`].
pub fn custom(argument: impl Argument + 'static) -> ArgMatcher {
    ArgMatcher::Custom(Arc::new(argument))
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Self::Value(SqlValue::from(v))
                }
            }

            impl From<$ty> for ArgMatcher {
                fn from(v: $ty) -> Self {
                    Self::Value(SqlValue::from(v))
                }
            }
        )*
    };
}

impl_from_value!(bool, i16, i32, i64, f32, f64, String, &str, Vec<u8>, Vec<SqlValue>, SqlValue);

impl From<NamedArgs> for Arg {
    fn from(v: NamedArgs) -> Self {
        Self::Named(v)
    }
}

impl From<NamedArgs> for ArgMatcher {
    fn from(v: NamedArgs) -> Self {
        Self::Named(
            v.iter()
                .map(|(k, v)| (k.clone(), Self::Value(v.clone())))
                .collect(),
        )
    }
}

/// Why an observed argument list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsMismatch {
    /// Argument counts differ.
    #[error("expected {expected} arguments, got {actual}")]
    Count {
        /// Declared count.
        expected: usize,
        /// Observed count.
        actual: usize,
    },

    /// A positional argument differs.
    #[error("argument {index}: expected {expected}, got {actual}")]
    Value {
        /// Zero-based position.
        index: usize,
        /// Rendering of the declared matcher.
        expected: String,
        /// Rendering of the observed argument.
        actual: String,
    },

    /// A declared named argument is absent from the call.
    #[error("named argument '{0}' is missing")]
    MissingKey(String),

    /// A named argument differs.
    #[error("named argument '{key}': expected {expected}, got {actual}")]
    NamedValue {
        /// Argument name.
        key: String,
        /// Rendering of the declared matcher.
        expected: String,
        /// Rendering of the observed value.
        actual: String,
    },

    /// Rewriting the statement failed.
    #[error("error rewriting query: {0}")]
    Rewrite(#[from] RewriteError),
}

/// Strategy comparing declared arguments with observed ones.
pub trait ArgsComparator: Send + Sync + fmt::Debug {
    /// Compare `observed` against `expected` for a call with SQL `sql`.
    ///
    /// # Errors
    ///
    /// Returns an [`ArgsMismatch`] naming the first disagreement.
    fn compare(
        &self,
        sql: &str,
        expected: &[ArgMatcher],
        observed: &[Arg],
    ) -> Result<(), ArgsMismatch>;
}

/// The standard comparison rules described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparator;

impl ArgsComparator for DefaultComparator {
    fn compare(
        &self,
        sql: &str,
        expected: &[ArgMatcher],
        observed: &[Arg],
    ) -> Result<(), ArgsMismatch> {
        match (expected, observed) {
            ([], [_, ..]) => Err(ArgsMismatch::Count {
                expected: 0,
                actual: observed.len(),
            }),
            ([ArgMatcher::Named(declared)], [Arg::Named(actual)]) => {
                compare_named(declared, actual)
            }
            ([ArgMatcher::Rewriter(declared)], [single]) => {
                let Some(rewritten) = single.rewrite(sql) else {
                    return Err(ArgsMismatch::Value {
                        index: 0,
                        expected: format!("{declared:?}"),
                        actual: single.to_string(),
                    });
                };
                let (_, actual) = rewritten?;
                let (_, declared) = declared.rewrite_query(sql)?;
                let declared: Vec<ArgMatcher> =
                    declared.into_iter().map(ArgMatcher::Value).collect();
                compare_values(&declared, &actual)
            }
            (_, [single @ (Arg::Named(_) | Arg::Rewriter(_))]) => match single.rewrite(sql) {
                Some(rewritten) => {
                    let (_, actual) = rewritten?;
                    compare_values(expected, &actual)
                }
                None => compare_args(expected, observed),
            },
            _ => compare_args(expected, observed),
        }
    }
}

fn compare_named(
    declared: &BTreeMap<String, ArgMatcher>,
    actual: &NamedArgs,
) -> Result<(), ArgsMismatch> {
    for (key, matcher) in declared {
        let Some(value) = actual.get(key) else {
            return Err(ArgsMismatch::MissingKey(key.clone()));
        };
        if !matcher.matches_value(value) {
            return Err(ArgsMismatch::NamedValue {
                key: key.clone(),
                expected: matcher.to_string(),
                actual: value.to_string(),
            });
        }
    }
    Ok(())
}

fn compare_values(expected: &[ArgMatcher], actual: &[SqlValue]) -> Result<(), ArgsMismatch> {
    if expected.len() != actual.len() {
        return Err(ArgsMismatch::Count {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    for (index, (matcher, value)) in expected.iter().zip(actual).enumerate() {
        if !matcher.matches_value(value) {
            return Err(ArgsMismatch::Value {
                index,
                expected: matcher.to_string(),
                actual: value.to_string(),
            });
        }
    }
    Ok(())
}

fn compare_args(expected: &[ArgMatcher], actual: &[Arg]) -> Result<(), ArgsMismatch> {
    if expected.len() != actual.len() {
        return Err(ArgsMismatch::Count {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    for (index, (matcher, arg)) in expected.iter().zip(actual).enumerate() {
        let ok = match (matcher, arg) {
            (ArgMatcher::Any, _) => true,
            (m, Arg::Value(value)) => m.matches_value(value),
            (ArgMatcher::Named(declared), Arg::Named(named)) => {
                compare_named(declared, named).is_ok()
            }
            (ArgMatcher::Rewriter(declared), Arg::Rewriter(observed)) => {
                std::ptr::addr_eq(Arc::as_ptr(declared), Arc::as_ptr(observed))
            }
            _ => false,
        };
        if !ok {
            return Err(ArgsMismatch::Value {
                index,
                expected: matcher.to_string(),
                actual: arg.to_string(),
            });
        }
    }
    Ok(())
}
