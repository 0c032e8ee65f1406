//! Call descriptors.
//!
//! A [`Call`] is built fresh for every operation invoked on the session and
//! dropped once it has been resolved against the expectation queue.

use std::fmt;

use crate::args::Arg;
use crate::batch::QueuedQuery;
use crate::transaction::TxOptions;

/// Every operation an expectation can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExpectationKind {
    /// Connection liveness check.
    Ping,
    /// Statement returning rows (`query` and `query_row`).
    Query,
    /// Statement returning a command tag.
    Exec,
    /// Prepared statement creation.
    Prepare,
    /// Prepared statement release.
    Deallocate,
    /// Bulk copy into a table.
    CopyFrom,
    /// Batched statements.
    SendBatch,
    /// Transaction start.
    Begin,
    /// Transaction commit.
    Commit,
    /// Transaction rollback.
    Rollback,
    /// Session close.
    Close,
}

impl ExpectationKind {
    /// Name of the session operation.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Query => "query",
            Self::Exec => "exec",
            Self::Prepare => "prepare",
            Self::Deallocate => "deallocate",
            Self::CopyFrom => "copy_from",
            Self::SendBatch => "send_batch",
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Close => "close",
        }
    }

    /// Name used when describing an expectation of this kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Ping => "ExpectedPing",
            Self::Query => "ExpectedQuery",
            Self::Exec => "ExpectedExec",
            Self::Prepare => "ExpectedPrepare",
            Self::Deallocate => "ExpectedDeallocate",
            Self::CopyFrom => "ExpectedCopyFrom",
            Self::SendBatch => "ExpectedSendBatch",
            Self::Begin => "ExpectedBegin",
            Self::Commit => "ExpectedCommit",
            Self::Rollback => "ExpectedRollback",
            Self::Close => "ExpectedClose",
        }
    }

    /// Whether calls of this kind carry SQL arguments.
    #[must_use]
    pub fn takes_args(&self) -> bool {
        matches!(self, Self::Query | Self::Exec)
    }
}

impl fmt::Display for ExpectationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// What an observed call was aimed at.
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// Operations without a target (ping, commit, ...).
    None,
    /// Statement text.
    Sql(String),
    /// Prepared statement name and text.
    Prepare {
        /// Statement name.
        name: String,
        /// Statement text.
        sql: String,
    },
    /// Statement to release; `None` releases all.
    Deallocate(Option<String>),
    /// Bulk copy destination and the number of source rows.
    CopyFrom {
        /// Table identifier parts.
        table: Vec<String>,
        /// Column names.
        columns: Vec<String>,
        /// Number of source rows.
        rows: usize,
    },
    /// Flattened batch.
    Batch(Vec<QueuedQuery>),
    /// Transaction options.
    Tx(TxOptions),
}

/// One observed invocation of a session operation.
#[derive(Debug, Clone)]
pub struct Call {
    pub(crate) kind: ExpectationKind,
    pub(crate) target: CallTarget,
    pub(crate) args: Vec<Arg>,
}

impl Call {
    /// Describe a call.
    #[must_use]
    pub fn new(kind: ExpectationKind, target: CallTarget, args: Vec<Arg>) -> Self {
        Self { kind, target, args }
    }

    /// The operation kind.
    #[must_use]
    pub fn kind(&self) -> ExpectationKind {
        self.kind
    }

    /// The call target.
    #[must_use]
    pub fn target(&self) -> &CallTarget {
        &self.target
    }

    /// The call arguments.
    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.kind.operation();
        match &self.target {
            CallTarget::None => write!(f, "{op}()"),
            CallTarget::Sql(sql) => {
                write!(f, "{op}('{sql}'")?;
                if !self.args.is_empty() {
                    f.write_str(", [")?;
                    for (i, arg) in self.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str("]")?;
                }
                f.write_str(")")
            }
            CallTarget::Prepare { name, sql } => write!(f, "{op}('{name}', '{sql}')"),
            CallTarget::Deallocate(Some(name)) => write!(f, "{op}('{name}')"),
            CallTarget::Deallocate(None) => write!(f, "{op}_all()"),
            CallTarget::CopyFrom {
                table,
                columns,
                rows,
            } => write!(f, "{op}({table:?}, {columns:?}, {rows} rows)"),
            CallTarget::Batch(queries) => {
                write!(f, "{op}([")?;
                for (i, q) in queries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}'", q.sql)?;
                }
                f.write_str("])")
            }
            CallTarget::Tx(opts) => write!(f, "{op}('{opts}')"),
        }
    }
}
