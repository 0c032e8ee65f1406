//! Mock session error types.

use std::sync::Arc;

use sqlmock_types::TypeError;
use thiserror::Error;

/// A configured failure, shared between the expectation and every call it
/// answers.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the mock session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No declared expectation accepted the call.
    ///
    /// Argument mismatches land here too: an expectation whose kind and
    /// target fit but whose arguments disagree does not match at all.
    #[error("call to {call} was not expected: {reason}")]
    Unmatched {
        /// Rendering of the incoming call.
        call: String,
        /// Why the closest candidate was rejected.
        reason: String,
    },

    /// The matched expectation was configured to fail with this error.
    #[error("{0}")]
    Configured(SharedError),

    /// The call context was cancelled while the response was delayed.
    #[error("call cancelled while awaiting a delayed response")]
    Cancelled,

    /// The call context deadline passed while the response was delayed.
    #[error("deadline exceeded while awaiting a delayed response")]
    DeadlineExceeded,

    /// Verification found expectations that were not met.
    #[error(transparent)]
    Unmet(#[from] UnmetExpectations),

    /// A single-row query returned no rows.
    #[error("no rows in result set")]
    NoRows,

    /// Building or reading a value container failed.
    ///
    /// The engine never produces this itself. It lets test code apply `?`
    /// to [`Rows::add_row`](sqlmock_types::Rows::add_row) and friends in a
    /// function returning this crate's [`Result`].
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl Error {
    /// Check if no expectation matched the call.
    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        matches!(self, Self::Unmatched { .. })
    }

    /// Check if the call was cancelled or timed out during a delay.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Check if this is a failure configured on the expectation.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Get the configured failure, for downcasting to the original type.
    #[must_use]
    pub fn configured(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Configured(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Every expectation still unmet when verification ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_unmet(.descriptions))]
pub struct UnmetExpectations {
    descriptions: Vec<String>,
}

impl UnmetExpectations {
    pub(crate) fn new(descriptions: Vec<String>) -> Self {
        Self { descriptions }
    }

    /// Descriptions of the unmet expectations, in declaration order.
    #[must_use]
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// Number of unmet expectations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// Check whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

fn render_unmet(descriptions: &[String]) -> String {
    let mut out = if descriptions.len() == 1 {
        String::from("there is a remaining expectation which was not matched:\n")
    } else {
        format!(
            "there are {} remaining expectations which were not matched:\n",
            descriptions.len()
        )
    };
    for description in descriptions {
        out.push_str(description);
    }
    out
}

/// Result type for mock session operations.
pub type Result<T> = std::result::Result<T, Error>;
