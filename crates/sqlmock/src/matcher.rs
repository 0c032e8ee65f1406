//! Query text matching strategies.
//!
//! A [`QueryMatcher`] decides whether the SQL text of an incoming call
//! satisfies the text an expectation was declared with. The strategy is
//! chosen once per session (see [`MockConfig`](crate::MockConfig)) and
//! applies to every expectation, including prepared statement SQL, batch
//! elements and rewritten SQL.
//!
//! | Strategy | Expected text is |
//! |----------|------------------|
//! | [`RegexMatcher`] (default) | a regex searched for in the actual text |
//! | [`EqualMatcher`] | compared for equality after whitespace normalisation |
//! | [`QueryMatcherFn`] | handed to a user closure |

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;

/// Why a query text did not match.
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// The actual text does not satisfy the expected text.
    #[error("query '{actual}' does not match expected '{expected}'")]
    Mismatch {
        /// Expected text as declared.
        expected: String,
        /// Actual text of the call.
        actual: String,
    },

    /// The expected text is not a valid pattern.
    #[error("invalid query pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compilation failure.
        #[source]
        source: regex::Error,
    },
}

impl MatchError {
    /// Build a mismatch error.
    #[must_use]
    pub fn mismatch(expected: &str, actual: &str) -> Self {
        Self::Mismatch {
            expected: expected.to_owned(),
            actual: actual.to_owned(),
        }
    }
}

/// Strategy comparing an expected query text with an actual one.
///
/// Implementations hold no per-call state; `Ok(())` means the texts match.
pub trait QueryMatcher: Send + Sync + fmt::Debug {
    /// Compare `actual` against `expected`.
    ///
    /// # Errors
    ///
    /// Returns a [`MatchError`] describing the mismatch.
    fn matches(&self, expected: &str, actual: &str) -> Result<(), MatchError>;
}

/// Treats the expected text as a regular expression searched for in the
/// actual text.
///
/// Compiled patterns are cached for the lifetime of the matcher.
#[derive(Debug, Default)]
pub struct RegexMatcher {
    cache: Mutex<HashMap<String, Regex>>,
}

impl RegexMatcher {
    /// Create a matcher with an empty pattern cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, pattern: &str) -> Result<Regex, MatchError> {
        let mut cache = self.cache.lock();
        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|source| MatchError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        cache.insert(pattern.to_owned(), re.clone());
        Ok(re)
    }
}

impl QueryMatcher for RegexMatcher {
    fn matches(&self, expected: &str, actual: &str) -> Result<(), MatchError> {
        if self.compiled(expected)?.is_match(actual) {
            Ok(())
        } else {
            Err(MatchError::mismatch(expected, actual))
        }
    }
}

/// Compares texts for equality after collapsing whitespace runs to a single
/// space and trimming both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualMatcher;

impl QueryMatcher for EqualMatcher {
    fn matches(&self, expected: &str, actual: &str) -> Result<(), MatchError> {
        if normalize_whitespace(expected) == normalize_whitespace(actual) {
            Ok(())
        } else {
            Err(MatchError::mismatch(expected, actual))
        }
    }
}

/// Collapse every whitespace run to one space and trim the ends.
#[must_use]
pub fn normalize_whitespace(sql: &str) -> String {
    static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"\s+").unwrap()
    });

    WHITESPACE_RE.replace_all(sql, " ").trim().to_owned()
}

/// Adapts a closure into a [`QueryMatcher`].
pub struct QueryMatcherFn<F>(pub F);

impl<F> QueryMatcher for QueryMatcherFn<F>
where
    F: Fn(&str, &str) -> Result<(), MatchError> + Send + Sync,
{
    fn matches(&self, expected: &str, actual: &str) -> Result<(), MatchError> {
        (self.0)(expected, actual)
    }
}

impl<F> fmt::Debug for QueryMatcherFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryMatcherFn").field(&"<fn>").finish()
    }
}
