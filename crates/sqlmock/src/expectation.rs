//! Declared expectations.
//!
//! An [`Expectation`] is a handle to one anticipated call. It is returned by
//! the `expect_*` methods of [`MockSession`](crate::MockSession) and
//! configured fluently before the code under test runs:
//!
//! ```rust,ignore
//! mock.expect_exec("^INSERT INTO users")
//!     .with_args(["john", any_arg()])
//!     .will_return_result(CommandTag::new("INSERT 0", 1))
//!     .times(2);
//! ```
//!
//! Configuration and matching are expected to be temporally disjoint:
//! configuring an expectation while calls are being matched against it is
//! memory safe but its outcome is unspecified.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use sqlmock_types::{CommandTag, Rows};

use crate::args::{ArgMatcher, ArgsComparator};
use crate::batch::{BatchResults, ExpectedBatch};
use crate::call::{Call, CallTarget, ExpectationKind};
use crate::error::SharedError;
use crate::matcher::QueryMatcher;
use crate::transaction::TxOptions;

/// What an expectation is aimed at.
#[derive(Debug, Clone)]
pub enum Target {
    /// Operations without a target.
    None,
    /// SQL text, interpreted by the session's query matcher.
    Sql(String),
    /// Prepared statement name (equality) and SQL (query matcher).
    Prepare {
        /// Statement name.
        name: String,
        /// Statement SQL.
        sql: String,
    },
    /// A named statement, or `None` for "all statements".
    Deallocate(Option<String>),
    /// Copy destination, compared by equality.
    CopyFrom {
        /// Table identifier parts.
        table: Vec<String>,
        /// Column names.
        columns: Vec<String>,
    },
    /// Batch elements, compared in order.
    Batch(ExpectedBatch),
    /// Transaction options; `None` accepts any.
    Tx(Option<TxOptions>),
}

/// Success payload handed back to the session operation.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// The operation's default response.
    #[default]
    Default,
    /// A result set.
    Rows(Rows),
    /// A command completion tag.
    Result(CommandTag),
    /// Number of copied rows.
    Copied(i64),
    /// Per-statement batch results.
    Batch(BatchResults),
}

/// Configured outcome of a matched call.
#[derive(Debug, Clone)]
pub enum Response {
    /// Succeed with a payload.
    Return(Payload),
    /// Fail with this error, returned verbatim.
    Fail(SharedError),
    /// Unwind with this message.
    Panic(String),
}

impl Default for Response {
    fn default() -> Self {
        Self::Return(Payload::Default)
    }
}

/// Minimum and maximum number of matching calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    /// Calls required for verification.
    pub min: u32,
    /// Calls after which the expectation can no longer be claimed; `None`
    /// is unbounded.
    pub max: Option<u32>,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::exactly(1)
    }
}

impl Repeat {
    /// Exactly `n` calls.
    #[must_use]
    pub fn exactly(n: u32) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }
}

#[derive(Debug, Default)]
struct Modifiers {
    args: Option<Vec<ArgMatcher>>,
    rewritten_sql: Option<String>,
    response: Response,
    delay: Option<Duration>,
    optional: bool,
    repeat: Repeat,
}

#[derive(Debug)]
struct Inner {
    kind: ExpectationKind,
    target: Target,
    modifiers: Mutex<Modifiers>,
    calls: AtomicU32,
}

/// Handle to one declared expectation.
///
/// Cloning the handle shares the expectation; the session keeps its own
/// handle in the queue.
#[derive(Debug, Clone)]
pub struct Expectation {
    inner: Arc<Inner>,
}

impl Expectation {
    pub(crate) fn new(kind: ExpectationKind, target: Target) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                target,
                modifiers: Mutex::new(Modifiers::default()),
                calls: AtomicU32::new(0),
            }),
        }
    }

    /// Expect these arguments, position by position.
    ///
    /// Without this call a query or exec must be made with no arguments.
    /// Arguments are only compared for query and exec expectations.
    pub fn with_args<I, A>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ArgMatcher>,
    {
        self.inner.modifiers.lock().args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Also require the effective SQL, after a rewriting argument has been
    /// applied, to match `sql`.
    pub fn with_rewritten_sql(&self, sql: impl Into<String>) -> &Self {
        self.inner.modifiers.lock().rewritten_sql = Some(sql.into());
        self
    }

    /// Respond with a result set.
    pub fn will_return_rows(&self, rows: Rows) -> &Self {
        self.set_response(Response::Return(Payload::Rows(rows)))
    }

    /// Respond with a command tag.
    pub fn will_return_result(&self, tag: CommandTag) -> &Self {
        self.set_response(Response::Return(Payload::Result(tag)))
    }

    /// Respond with a copied row count.
    pub fn will_return_copied(&self, rows: i64) -> &Self {
        self.set_response(Response::Return(Payload::Copied(rows)))
    }

    /// Respond with per-statement batch results.
    pub fn will_return_batch(&self, results: BatchResults) -> &Self {
        self.set_response(Response::Return(Payload::Batch(results)))
    }

    /// Fail every matching call with `err`.
    pub fn will_return_error(
        &self,
        err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> &Self {
        let err: Box<dyn std::error::Error + Send + Sync> = err.into();
        self.set_response(Response::Fail(Arc::from(err)))
    }

    /// Panic with `message` on every matching call.
    pub fn will_panic(&self, message: impl Into<String>) -> &Self {
        self.set_response(Response::Panic(message.into()))
    }

    /// Wait for `delay` before responding. The wait observes the call's
    /// context.
    pub fn will_delay_for(&self, delay: Duration) -> &Self {
        self.inner.modifiers.lock().delay = Some(delay);
        self
    }

    /// Let verification pass even if this expectation is never matched.
    pub fn maybe(&self) -> &Self {
        self.inner.modifiers.lock().optional = true;
        self
    }

    /// Require exactly `n` calls. Zero is treated as one.
    pub fn times(&self, n: u32) -> &Self {
        self.set_repeat(Repeat::exactly(n.max(1)))
    }

    /// Require at least `n` calls, accepting any number more.
    pub fn at_least(&self, n: u32) -> &Self {
        self.set_repeat(Repeat { min: n, max: None })
    }

    /// Accept up to `n` calls, none required. Zero is treated as one.
    pub fn at_most(&self, n: u32) -> &Self {
        self.set_repeat(Repeat {
            min: 0,
            max: Some(n.max(1)),
        })
    }

    /// Require at least `min` calls and accept up to `max`.
    pub fn between(&self, min: u32, max: u32) -> &Self {
        self.set_repeat(Repeat {
            min,
            max: Some(max.max(min).max(1)),
        })
    }

    fn set_response(&self, response: Response) -> &Self {
        self.inner.modifiers.lock().response = response;
        self
    }

    fn set_repeat(&self, repeat: Repeat) -> &Self {
        self.inner.modifiers.lock().repeat = repeat;
        self
    }

    /// The operation this expectation is declared for.
    #[must_use]
    pub fn kind(&self) -> ExpectationKind {
        self.inner.kind
    }

    /// The declared target.
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    /// Number of calls matched so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.inner.calls.load(Ordering::Acquire)
    }

    /// Minimum and maximum call counts.
    #[must_use]
    pub fn repeat(&self) -> Repeat {
        self.inner.modifiers.lock().repeat
    }

    /// Check whether the expectation is optional.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.inner.modifiers.lock().optional
    }

    /// Check whether verification would accept this expectation now.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        let m = self.inner.modifiers.lock();
        m.optional || self.calls() >= m.repeat.min
    }

    /// Check whether the expectation can no longer be claimed.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        let max = self.inner.modifiers.lock().repeat.max;
        max.is_some_and(|max| self.calls() >= max)
    }

    /// Required and still short of its minimum.
    pub(crate) fn is_pending(&self) -> bool {
        !self.is_satisfied()
    }

    pub(crate) fn record_call(&self) -> u32 {
        self.inner.calls.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn delay(&self) -> Option<Duration> {
        self.inner.modifiers.lock().delay
    }

    pub(crate) fn response(&self) -> Response {
        self.inner.modifiers.lock().response.clone()
    }

    /// Check whether `call` satisfies this expectation's target and
    /// arguments. The kind is checked by the caller.
    pub(crate) fn accepts(
        &self,
        call: &Call,
        matcher: &dyn QueryMatcher,
        comparator: &dyn ArgsComparator,
    ) -> Result<(), String> {
        let m = self.inner.modifiers.lock();
        match (&self.inner.target, &call.target) {
            (Target::None, CallTarget::None) => Ok(()),
            (Target::Sql(expected), CallTarget::Sql(actual)) => {
                matcher
                    .matches(expected, actual)
                    .map_err(|e| e.to_string())?;
                if self.inner.kind.takes_args() {
                    let declared = m.args.as_deref().unwrap_or_default();
                    comparator
                        .compare(actual, declared, &call.args)
                        .map_err(|e| format!("arguments do not match: {e}"))?;
                }
                if let Some(rewritten) = &m.rewritten_sql {
                    let effective = effective_sql(actual, call)?;
                    matcher
                        .matches(rewritten, &effective)
                        .map_err(|e| format!("rewritten {e}"))?;
                }
                Ok(())
            }
            (
                Target::Prepare { name, sql },
                CallTarget::Prepare {
                    name: actual_name,
                    sql: actual_sql,
                },
            ) => {
                if name != actual_name {
                    return Err(format!(
                        "statement name '{actual_name}' does not match expected '{name}'"
                    ));
                }
                matcher.matches(sql, actual_sql).map_err(|e| e.to_string())
            }
            (Target::Deallocate(expected), CallTarget::Deallocate(actual)) => {
                if expected == actual {
                    Ok(())
                } else {
                    Err(format!(
                        "deallocates {} instead of {}",
                        deallocated(actual.as_deref()),
                        deallocated(expected.as_deref())
                    ))
                }
            }
            (
                Target::CopyFrom { table, columns },
                CallTarget::CopyFrom {
                    table: actual_table,
                    columns: actual_columns,
                    ..
                },
            ) => {
                if table != actual_table {
                    return Err(format!(
                        "table {actual_table:?} does not match expected {table:?}"
                    ));
                }
                if columns != actual_columns {
                    return Err(format!(
                        "columns {actual_columns:?} do not match expected {columns:?}"
                    ));
                }
                Ok(())
            }
            (Target::Batch(expected), CallTarget::Batch(queries)) => {
                if expected.len() != queries.len() {
                    return Err(format!(
                        "batch has {} statements, expected {}",
                        queries.len(),
                        expected.len()
                    ));
                }
                for (index, (element, query)) in expected.elements.iter().zip(queries).enumerate()
                {
                    matcher
                        .matches(&element.sql, &query.sql)
                        .map_err(|e| format!("batch statement {index}: {e}"))?;
                    let declared = element.args.as_deref().unwrap_or_default();
                    comparator
                        .compare(&query.sql, declared, &query.args)
                        .map_err(|e| format!("batch statement {index}: {e}"))?;
                }
                Ok(())
            }
            (Target::Tx(None), CallTarget::Tx(_)) => Ok(()),
            (Target::Tx(Some(expected)), CallTarget::Tx(actual)) => {
                if expected == actual {
                    Ok(())
                } else {
                    Err(format!(
                        "transaction options '{actual}' do not match expected '{expected}'"
                    ))
                }
            }
            _ => Err(format!(
                "call shape does not fit {}",
                self.inner.kind.type_name()
            )),
        }
    }
}

/// SQL after the call's single rewriting argument, if any, has been applied.
fn effective_sql(sql: &str, call: &Call) -> Result<String, String> {
    match call.args.as_slice() {
        [single] => match single.rewrite(sql) {
            Some(Ok((rewritten, _))) => Ok(rewritten),
            Some(Err(e)) => Err(format!("error rewriting query: {e}")),
            None => Ok(sql.to_owned()),
        },
        _ => Ok(sql.to_owned()),
    }
}

fn deallocated(name: Option<&str>) -> String {
    name.map_or_else(|| "all statements".to_owned(), |n| format!("'{n}'"))
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.inner.kind;
        let m = self.inner.modifiers.lock();
        let mut lines = Vec::new();

        match &self.inner.target {
            Target::None => {}
            Target::Sql(sql) => lines.push(format!("matches sql: '{sql}'")),
            Target::Prepare { name, sql } => {
                lines.push(format!("matches statement name: '{name}'"));
                lines.push(format!("matches sql: '{sql}'"));
            }
            Target::Deallocate(Some(name)) => {
                lines.push(format!("matches statement name: '{name}'"));
            }
            Target::Deallocate(None) => lines.push("deallocates all statements".to_owned()),
            Target::CopyFrom { table, columns } => {
                lines.push(format!("matches table name: '{}'", table.join(".")));
                lines.push(format!("matches column names: {columns:?}"));
            }
            Target::Batch(batch) => {
                if batch.is_empty() {
                    lines.push("matches an empty batch".to_owned());
                }
                for (index, element) in batch.elements.iter().enumerate() {
                    lines.push(format!("element {index} {element}"));
                }
            }
            Target::Tx(Some(opts)) => lines.push(format!("matches options: '{opts}'")),
            Target::Tx(None) => {}
        }

        if kind.takes_args() {
            match m.args.as_deref() {
                None | Some([]) => lines.push("is without arguments".to_owned()),
                Some(args) => {
                    let mut line = String::from("is with arguments:");
                    for (index, arg) in args.iter().enumerate() {
                        line.push_str(&format!("\n\t\t{index} - {arg}"));
                    }
                    lines.push(line);
                }
            }
        }

        if let Some(sql) = &m.rewritten_sql {
            lines.push(format!("rewritten sql matches: '{sql}'"));
        }

        match &m.response {
            Response::Return(Payload::Default) => {}
            Response::Return(Payload::Rows(rows)) => lines.push(format!(
                "returns rows: {} row(s) of columns {:?}",
                rows.len(),
                rows.columns()
            )),
            Response::Return(Payload::Result(tag)) => lines.push(format!("returns result: {tag}")),
            Response::Return(Payload::Copied(n)) => lines.push(format!("returns copied rows: {n}")),
            Response::Return(Payload::Batch(results)) => {
                lines.push(format!("returns batch results: {}", results.len()));
            }
            Response::Fail(err) => lines.push(format!("returns error: {err}")),
            Response::Panic(message) => lines.push(format!("panics with: {message}")),
        }

        if let Some(delay) = m.delay {
            lines.push(format!("delayed execution for: {delay:?}"));
        }
        if m.optional {
            lines.push("execution is optional".to_owned());
        }
        match m.repeat {
            Repeat { min, max: Some(max) } if min == max && max > 1 => {
                lines.push(format!("execution calls awaited: {max}"));
            }
            Repeat { min, max: None } => {
                lines.push(format!("execution calls awaited: at least {min}"));
            }
            Repeat { min, max: Some(max) } if min != max => {
                lines.push(format!("execution calls awaited: {min}..={max}"));
            }
            _ => {}
        }

        write!(
            f,
            "{} => expecting call to {}()",
            kind.type_name(),
            kind.operation()
        )?;
        if lines.is_empty() {
            return writeln!(f);
        }
        writeln!(f, ":")?;
        for line in lines {
            writeln!(f, "\t- {line}")?;
        }
        Ok(())
    }
}
