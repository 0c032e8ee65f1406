//! Batched statements.
//!
//! A [`Batch`] is what code under test sends; an [`ExpectedBatch`] is what
//! the test declares. The engine sees a batch as its flattened list of
//! queued statements: a call matches when the element counts agree and
//! every element's SQL and arguments match in order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use sqlmock_types::{CommandTag, Row, Rows};

use crate::args::{Arg, ArgMatcher};
use crate::error::{Error, Result, SharedError};

/// One statement queued in a [`Batch`].
#[derive(Debug, Clone)]
pub struct QueuedQuery {
    /// Statement text.
    pub sql: String,
    /// Statement arguments.
    pub args: Vec<Arg>,
}

/// Statements to be sent in a single round trip.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    queries: Vec<QueuedQuery>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a statement with its arguments.
    pub fn queue(&mut self, sql: impl Into<String>, args: Vec<Arg>) -> &mut Self {
        self.queries.push(QueuedQuery {
            sql: sql.into(),
            args,
        });
        self
    }

    /// Queued statements in order.
    #[must_use]
    pub fn queries(&self) -> &[QueuedQuery] {
        &self.queries
    }

    /// Number of queued statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Check whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// One declared statement of an [`ExpectedBatch`].
#[derive(Debug, Clone)]
pub struct BatchElement {
    pub(crate) sql: String,
    pub(crate) args: Option<Vec<ArgMatcher>>,
}

impl BatchElement {
    /// Expect a statement matching `sql` with no arguments.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: None,
        }
    }

    /// Expect these arguments.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ArgMatcher>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Display for BatchElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matches sql: '{}'", self.sql)?;
        match &self.args {
            Some(args) if !args.is_empty() => {
                f.write_str(" with arguments: [")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            _ => f.write_str(" without arguments"),
        }
    }
}

/// The batch a `send_batch` call is expected to carry.
#[derive(Debug, Clone, Default)]
pub struct ExpectedBatch {
    pub(crate) elements: Vec<BatchElement>,
}

impl ExpectedBatch {
    /// An expectation for an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one element.
    #[must_use]
    pub fn element(mut self, element: BatchElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Append several elements.
    #[must_use]
    pub fn elements(mut self, elements: impl IntoIterator<Item = BatchElement>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Number of declared elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check whether no elements are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Outcome of one statement in a batch.
#[derive(Debug, Clone)]
pub enum BatchResult {
    /// The statement completed with a tag.
    Exec(CommandTag),
    /// The statement returned rows.
    Query(Rows),
    /// The statement failed.
    Error(SharedError),
}

/// Per-statement results handed back by `send_batch`, consumed in order.
///
/// Once the configured results run out, `exec` yields empty tags and
/// `query` yields empty result sets.
#[derive(Debug, Clone, Default)]
pub struct BatchResults {
    results: VecDeque<BatchResult>,
}

impl BatchResults {
    /// No configured results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exec result.
    #[must_use]
    pub fn with_exec(mut self, tag: CommandTag) -> Self {
        self.results.push_back(BatchResult::Exec(tag));
        self
    }

    /// Append a query result.
    #[must_use]
    pub fn with_rows(mut self, rows: Rows) -> Self {
        self.results.push_back(BatchResult::Query(rows));
        self
    }

    /// Append a failing statement.
    #[must_use]
    pub fn with_error(mut self, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let err: Box<dyn std::error::Error + Send + Sync> = err.into();
        self.results.push_back(BatchResult::Error(Arc::from(err)));
        self
    }

    /// Number of results not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check whether every result has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the next result as an exec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configured`] if the statement was configured to fail.
    pub fn exec(&mut self) -> Result<CommandTag> {
        match self.results.pop_front() {
            Some(BatchResult::Exec(tag)) => Ok(tag),
            Some(BatchResult::Error(err)) => Err(Error::Configured(err)),
            Some(BatchResult::Query(_)) | None => Ok(CommandTag::empty()),
        }
    }

    /// Consume the next result as a query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configured`] if the statement was configured to fail.
    pub fn query(&mut self) -> Result<Rows> {
        match self.results.pop_front() {
            Some(BatchResult::Query(rows)) => Ok(rows),
            Some(BatchResult::Error(err)) => Err(Error::Configured(err)),
            Some(BatchResult::Exec(_)) | None => Ok(Rows::default()),
        }
    }

    /// Consume the next result as a single-row query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`] if the result set is empty, or the
    /// configured failure.
    pub fn query_row(&mut self) -> Result<Row> {
        self.query()?.first().ok_or(Error::NoRows)
    }

    /// Discard the remaining results, reporting the first configured failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configured`] if an unconsumed statement was
    /// configured to fail.
    pub fn close(mut self) -> Result<()> {
        while let Some(result) = self.results.pop_front() {
            if let BatchResult::Error(err) = result {
                return Err(Error::Configured(err));
            }
        }
        Ok(())
    }
}
