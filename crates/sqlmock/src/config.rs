//! Mock session configuration.

use std::fmt;
use std::sync::Arc;

use crate::args::{ArgsComparator, DefaultComparator};
use crate::matcher::{QueryMatcher, RegexMatcher};

/// How declaration order constrains which expectation a call may claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchOrder {
    /// Expectations of one kind are consumed in declaration order: an
    /// unmet, required expectation blocks later ones of the same kind.
    #[default]
    PerKind,
    /// Any expectation with remaining capacity may be claimed, the earliest
    /// declared winning ties.
    Unordered,
    /// An unmet, required expectation of any kind blocks every later one.
    Strict,
}

impl MatchOrder {
    /// Check whether declaration order matters at all.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        !matches!(self, Self::Unordered)
    }
}

impl fmt::Display for MatchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerKind => "per-kind",
            Self::Unordered => "unordered",
            Self::Strict => "strict",
        })
    }
}

/// Configuration a [`MockSession`](crate::MockSession) is created with.
///
/// The matching strategies are fixed for the lifetime of the session and
/// apply uniformly to every expectation.
#[derive(Clone)]
#[non_exhaustive]
pub struct MockConfig {
    /// Ordering mode (default: [`MatchOrder::PerKind`]).
    pub match_order: MatchOrder,
    /// Query text matcher (default: [`RegexMatcher`]).
    pub query_matcher: Arc<dyn QueryMatcher>,
    /// Argument comparator (default: [`DefaultComparator`]).
    pub args_comparator: Arc<dyn ArgsComparator>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            match_order: MatchOrder::default(),
            query_matcher: Arc::new(RegexMatcher::new()),
            args_comparator: Arc::new(DefaultComparator),
        }
    }
}

impl fmt::Debug for MockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConfig")
            .field("match_order", &self.match_order)
            .field("query_matcher", &self.query_matcher)
            .field("args_comparator", &self.args_comparator)
            .finish()
    }
}

impl MockConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ordering mode.
    #[must_use]
    pub fn match_order(mut self, order: MatchOrder) -> Self {
        self.match_order = order;
        self
    }

    /// Set the query text matcher.
    #[must_use]
    pub fn query_matcher(mut self, matcher: impl QueryMatcher + 'static) -> Self {
        self.query_matcher = Arc::new(matcher);
        self
    }

    /// Set the argument comparator.
    #[must_use]
    pub fn args_comparator(mut self, comparator: impl ArgsComparator + 'static) -> Self {
        self.args_comparator = Arc::new(comparator);
        self
    }
}
