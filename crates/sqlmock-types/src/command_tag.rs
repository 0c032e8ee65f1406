//! Command completion tags.

use std::fmt;

/// The completion tag returned by a statement that does not produce rows,
/// such as `INSERT 15` or `UPDATE 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CommandTag {
    tag: String,
}

impl CommandTag {
    /// Build a tag from an operation keyword and an affected row count.
    #[must_use]
    pub fn new(operation: &str, rows_affected: i64) -> Self {
        Self {
            tag: format!("{operation} {rows_affected}"),
        }
    }

    /// Wrap an already formatted tag.
    #[must_use]
    pub fn from_raw(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// An empty tag.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// Number of rows affected, parsed from the trailing integer.
    ///
    /// Returns 0 when the tag does not end in a number.
    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.tag
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    /// Check whether the tag is for an INSERT.
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.starts_with_keyword("INSERT")
    }

    /// Check whether the tag is for an UPDATE.
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.starts_with_keyword("UPDATE")
    }

    /// Check whether the tag is for a DELETE.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.starts_with_keyword("DELETE")
    }

    /// Check whether the tag is for a SELECT.
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.starts_with_keyword("SELECT")
    }

    fn starts_with_keyword(&self, keyword: &str) -> bool {
        self.tag
            .split(' ')
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case(keyword))
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}
