//! Value container error types.

use thiserror::Error;

/// Errors raised while building or reading value containers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A row does not have one value per column.
    #[error("row has {actual} values, but the result set has {expected} columns")]
    ColumnCount {
        /// Number of columns declared on the result set.
        expected: usize,
        /// Number of values supplied for the row.
        actual: usize,
    },

    /// A column name is not part of the result set.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}
