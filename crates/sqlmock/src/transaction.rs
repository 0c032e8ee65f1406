//! Transaction options.
//!
//! `begin_tx` calls carry [`TxOptions`]; an expectation declared with
//! `expect_begin_tx` only accepts a call with equal options, while
//! `expect_begin` accepts any.

use std::fmt;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    /// Read uncommitted (dirty reads allowed).
    ReadUncommitted,

    /// Read committed (the usual server default).
    #[default]
    ReadCommitted,

    /// Repeatable read.
    RepeatableRead,

    /// Serializable (highest isolation).
    Serializable,
}

impl IsolationLevel {
    /// Get the isolation level name as used in SQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Reads and writes allowed.
    #[default]
    ReadWrite,
    /// Only reads allowed.
    ReadOnly,
}

impl AccessMode {
    /// Get the access mode as used in SQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadWrite => "READ WRITE",
            Self::ReadOnly => "READ ONLY",
        }
    }
}

/// Options a transaction is started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub struct TxOptions {
    /// Isolation level; `None` leaves the session default.
    pub isolation: Option<IsolationLevel>,
    /// Access mode.
    pub access_mode: AccessMode,
    /// Whether a serializable read-only transaction may be deferred.
    pub deferrable: bool,
}

impl TxOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    #[must_use]
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Set the access mode.
    #[must_use]
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Mark the transaction deferrable.
    #[must_use]
    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = deferrable;
        self
    }
}

impl fmt::Display for TxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BEGIN")?;
        if let Some(level) = self.isolation {
            write!(f, " ISOLATION LEVEL {}", level.name())?;
        }
        write!(f, " {}", self.access_mode.name())?;
        if self.deferrable {
            f.write_str(" DEFERRABLE")?;
        }
        Ok(())
    }
}
