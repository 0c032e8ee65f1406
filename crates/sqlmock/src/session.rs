//! The mocked session.
//!
//! [`MockSession`] exposes the operation surface of a database session.
//! Every operation builds a [`Call`], claims a matching expectation from the
//! queue, then applies the expectation's modifiers in a fixed order: the
//! delay (observing the call's [`CallContext`]), then a configured panic,
//! then the configured response or error.
//!
//! Code under test that should run against either a real connection or the
//! mock can be written against the [`Session`] trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlmock_types::{CommandTag, Row, Rows, SqlValue};

use crate::args::Arg;
use crate::batch::{Batch, BatchResults, ExpectedBatch};
use crate::call::{Call, CallTarget, ExpectationKind};
use crate::config::{MatchOrder, MockConfig};
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::expectation::{Expectation, Payload, Response, Target};
use crate::queue::ExpectationQueue;
use crate::transaction::TxOptions;

/// A prepared statement handed back by [`MockSession::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    name: String,
    sql: String,
}

impl PreparedStatement {
    /// Create a statement description.
    #[must_use]
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Statement name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statement SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Operations of a database session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Check that the connection is alive.
    async fn ping(&self, ctx: &CallContext) -> Result<()>;

    /// Run a statement returning rows.
    async fn query(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Rows>;

    /// Run a statement returning exactly one row.
    async fn query_row(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Row>;

    /// Run a statement returning a command tag.
    async fn exec(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<CommandTag>;

    /// Prepare a named statement.
    async fn prepare(
        &self,
        ctx: &CallContext,
        name: &str,
        sql: &str,
    ) -> Result<PreparedStatement>;

    /// Release a prepared statement.
    async fn deallocate(&self, ctx: &CallContext, name: &str) -> Result<()>;

    /// Release every prepared statement.
    async fn deallocate_all(&self, ctx: &CallContext) -> Result<()>;

    /// Bulk copy `rows` into `table`, returning the number of copied rows.
    async fn copy_from(
        &self,
        ctx: &CallContext,
        table: &[&str],
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<i64>;

    /// Send queued statements in one round trip.
    async fn send_batch(&self, ctx: &CallContext, batch: &Batch) -> Result<BatchResults>;

    /// Start a transaction with default options.
    async fn begin(&self, ctx: &CallContext) -> Result<()>;

    /// Start a transaction with `options`.
    async fn begin_tx(&self, ctx: &CallContext, options: TxOptions) -> Result<()>;

    /// Commit the current transaction.
    async fn commit(&self, ctx: &CallContext) -> Result<()>;

    /// Roll back the current transaction.
    async fn rollback(&self, ctx: &CallContext) -> Result<()>;

    /// Close the session.
    async fn close(&self, ctx: &CallContext) -> Result<()>;
}

/// A test double for a database session.
///
/// Declare expectations with the `expect_*` methods, run the code under
/// test, then check [`expectations_were_met`](Self::expectations_were_met).
/// Clones share the same expectation queue, so a session can be handed to
/// several tasks at once.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockSession::new();
/// mock.expect_ping().times(2);
///
/// let ctx = CallContext::background();
/// mock.ping(&ctx).await?;
/// assert!(mock.expectations_were_met().is_err());
/// mock.ping(&ctx).await?;
/// mock.expectations_were_met()?;
/// ```
#[derive(Debug, Clone)]
pub struct MockSession {
    queue: Arc<ExpectationQueue>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Create a session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a session with `config`.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            queue: Arc::new(ExpectationQueue::new(config)),
        }
    }

    /// Switch between per-kind ordered matching and unordered matching.
    pub fn match_expectations_in_order(&self, ordered: bool) {
        self.queue.set_order(if ordered {
            MatchOrder::PerKind
        } else {
            MatchOrder::Unordered
        });
    }

    /// The current ordering mode.
    #[must_use]
    pub fn match_order(&self) -> MatchOrder {
        self.queue.order()
    }

    /// Register an expectation for `kind` aimed at `target`.
    pub fn declare(&self, kind: ExpectationKind, target: Target) -> Expectation {
        self.queue.declare(kind, target)
    }

    /// Expect a ping.
    pub fn expect_ping(&self) -> Expectation {
        self.declare(ExpectationKind::Ping, Target::None)
    }

    /// Expect a query (or `query_row`) whose SQL matches `sql`.
    pub fn expect_query(&self, sql: impl Into<String>) -> Expectation {
        self.declare(ExpectationKind::Query, Target::Sql(sql.into()))
    }

    /// Expect an exec whose SQL matches `sql`.
    pub fn expect_exec(&self, sql: impl Into<String>) -> Expectation {
        self.declare(ExpectationKind::Exec, Target::Sql(sql.into()))
    }

    /// Expect a statement named `name` to be prepared from SQL matching
    /// `sql`.
    pub fn expect_prepare(&self, name: impl Into<String>, sql: impl Into<String>) -> Expectation {
        self.declare(
            ExpectationKind::Prepare,
            Target::Prepare {
                name: name.into(),
                sql: sql.into(),
            },
        )
    }

    /// Expect the statement `name` to be released.
    pub fn expect_deallocate(&self, name: impl Into<String>) -> Expectation {
        self.declare(
            ExpectationKind::Deallocate,
            Target::Deallocate(Some(name.into())),
        )
    }

    /// Expect every prepared statement to be released.
    pub fn expect_deallocate_all(&self) -> Expectation {
        self.declare(ExpectationKind::Deallocate, Target::Deallocate(None))
    }

    /// Expect a bulk copy into `table` with exactly these `columns`.
    pub fn expect_copy_from<T, C>(&self, table: T, columns: C) -> Expectation
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.declare(
            ExpectationKind::CopyFrom,
            Target::CopyFrom {
                table: table.into_iter().map(Into::into).collect(),
                columns: columns.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Expect a batch shaped like `batch`.
    pub fn expect_send_batch(&self, batch: ExpectedBatch) -> Expectation {
        self.declare(ExpectationKind::SendBatch, Target::Batch(batch))
    }

    /// Expect a transaction to start, with any options.
    pub fn expect_begin(&self) -> Expectation {
        self.declare(ExpectationKind::Begin, Target::Tx(None))
    }

    /// Expect a transaction to start with exactly `options`.
    pub fn expect_begin_tx(&self, options: TxOptions) -> Expectation {
        self.declare(ExpectationKind::Begin, Target::Tx(Some(options)))
    }

    /// Expect a commit.
    pub fn expect_commit(&self) -> Expectation {
        self.declare(ExpectationKind::Commit, Target::None)
    }

    /// Expect a rollback.
    pub fn expect_rollback(&self) -> Expectation {
        self.declare(ExpectationKind::Rollback, Target::None)
    }

    /// Expect the session to be closed.
    pub fn expect_close(&self) -> Expectation {
        self.declare(ExpectationKind::Close, Target::None)
    }

    /// Resolve `call` against the declared expectations and apply the
    /// claimed expectation's modifiers.
    ///
    /// Every operation funnels through here; adapters for other session
    /// shapes can call it directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unmatched`] if no expectation accepts the call,
    /// [`Error::Cancelled`] or [`Error::DeadlineExceeded`] if `ctx` ends
    /// during a configured delay, and [`Error::Configured`] for a
    /// configured failure.
    ///
    /// # Panics
    ///
    /// Panics with the configured message if the claimed expectation was
    /// set up with [`Expectation::will_panic`].
    pub async fn resolve(&self, ctx: &CallContext, call: Call) -> Result<Payload> {
        let expectation = self.queue.claim(&call)?;
        if let Some(delay) = expectation.delay() {
            delay_response(ctx, &call, delay).await?;
        }
        match expectation.response() {
            Response::Return(payload) => Ok(payload),
            Response::Fail(err) => Err(Error::Configured(err)),
            Response::Panic(message) => configured_panic(&message),
        }
    }

    /// Check that every required expectation was met.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unmet`] describing each unmet expectation.
    pub fn expectations_were_met(&self) -> Result<()> {
        self.queue.verify()
    }

    /// Every required expectation that has not yet reached its minimum call
    /// count.
    #[must_use]
    pub fn unmet_expectations(&self) -> Vec<Expectation> {
        self.queue.unmet()
    }

    /// Number of declared expectations.
    #[must_use]
    pub fn expectation_count(&self) -> usize {
        self.queue.len()
    }

    /// Check that the connection is alive.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Ping, CallTarget::None)
            .await
    }

    /// Run a statement returning rows. Without a configured result set the
    /// response is empty.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn query(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Rows> {
        let call = Call::new(ExpectationKind::Query, CallTarget::Sql(sql.to_owned()), args);
        match self.resolve(ctx, call).await? {
            Payload::Rows(rows) => Ok(rows),
            other => {
                unused_payload(ExpectationKind::Query, &other);
                Ok(Rows::default())
            }
        }
    }

    /// Run a statement and return its first row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`] if the result set is empty; otherwise see
    /// [`resolve`](Self::resolve).
    pub async fn query_row(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Row> {
        self.query(ctx, sql, args).await?.first().ok_or(Error::NoRows)
    }

    /// Run a statement returning a command tag. Without a configured result
    /// the tag is empty.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn exec(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<CommandTag> {
        let call = Call::new(ExpectationKind::Exec, CallTarget::Sql(sql.to_owned()), args);
        match self.resolve(ctx, call).await? {
            Payload::Result(tag) => Ok(tag),
            other => {
                unused_payload(ExpectationKind::Exec, &other);
                Ok(CommandTag::empty())
            }
        }
    }

    /// Prepare a named statement.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn prepare(
        &self,
        ctx: &CallContext,
        name: &str,
        sql: &str,
    ) -> Result<PreparedStatement> {
        let target = CallTarget::Prepare {
            name: name.to_owned(),
            sql: sql.to_owned(),
        };
        let payload = self
            .resolve(ctx, Call::new(ExpectationKind::Prepare, target, Vec::new()))
            .await?;
        unused_payload(ExpectationKind::Prepare, &payload);
        Ok(PreparedStatement::new(name, sql))
    }

    /// Release a prepared statement.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn deallocate(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let target = CallTarget::Deallocate(Some(name.to_owned()));
        self.resolve_unit(ctx, ExpectationKind::Deallocate, target)
            .await
    }

    /// Release every prepared statement.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn deallocate_all(&self, ctx: &CallContext) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Deallocate, CallTarget::Deallocate(None))
            .await
    }

    /// Bulk copy `rows` into `table`. Without a configured count the number
    /// of source rows is returned.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn copy_from(
        &self,
        ctx: &CallContext,
        table: &[&str],
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<i64> {
        let target = CallTarget::CopyFrom {
            table: table.iter().map(|s| (*s).to_owned()).collect(),
            columns: columns.iter().map(|s| (*s).to_owned()).collect(),
            rows: rows.len(),
        };
        match self
            .resolve(ctx, Call::new(ExpectationKind::CopyFrom, target, Vec::new()))
            .await?
        {
            Payload::Copied(n) => Ok(n),
            other => {
                unused_payload(ExpectationKind::CopyFrom, &other);
                Ok(i64::try_from(rows.len()).unwrap_or(i64::MAX))
            }
        }
    }

    /// Send queued statements in one round trip. Without configured results
    /// every statement yields an empty response.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn send_batch(&self, ctx: &CallContext, batch: &Batch) -> Result<BatchResults> {
        let target = CallTarget::Batch(batch.queries().to_vec());
        match self
            .resolve(ctx, Call::new(ExpectationKind::SendBatch, target, Vec::new()))
            .await?
        {
            Payload::Batch(results) => Ok(results),
            other => {
                unused_payload(ExpectationKind::SendBatch, &other);
                Ok(BatchResults::new())
            }
        }
    }

    /// Start a transaction with default options.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn begin(&self, ctx: &CallContext) -> Result<()> {
        self.begin_tx(ctx, TxOptions::default()).await
    }

    /// Start a transaction with `options`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn begin_tx(&self, ctx: &CallContext, options: TxOptions) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Begin, CallTarget::Tx(options))
            .await
    }

    /// Commit the current transaction.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn commit(&self, ctx: &CallContext) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Commit, CallTarget::None)
            .await
    }

    /// Roll back the current transaction.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn rollback(&self, ctx: &CallContext) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Rollback, CallTarget::None)
            .await
    }

    /// Close the session.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn close(&self, ctx: &CallContext) -> Result<()> {
        self.resolve_unit(ctx, ExpectationKind::Close, CallTarget::None)
            .await
    }

    async fn resolve_unit(
        &self,
        ctx: &CallContext,
        kind: ExpectationKind,
        target: CallTarget,
    ) -> Result<()> {
        let payload = self.resolve(ctx, Call::new(kind, target, Vec::new())).await?;
        unused_payload(kind, &payload);
        Ok(())
    }
}

async fn delay_response(ctx: &CallContext, call: &Call, delay: Duration) -> Result<()> {
    tracing::trace!(call = %call, ?delay, "delaying response");
    let result = ctx.sleep(delay).await;
    if let Err(err) = &result {
        tracing::trace!(call = %call, error = %err, "delayed response abandoned");
    }
    result
}

/// Log a configured payload the operation has no way to return.
fn unused_payload(kind: ExpectationKind, payload: &Payload) {
    if !matches!(payload, Payload::Default) {
        tracing::debug!(
            operation = %kind,
            ?payload,
            "configured response does not fit the operation, returning the default"
        );
    }
}

#[allow(clippy::panic)]
fn configured_panic(message: &str) -> ! {
    panic!("{message}")
}

#[async_trait]
impl Session for MockSession {
    async fn ping(&self, ctx: &CallContext) -> Result<()> {
        MockSession::ping(self, ctx).await
    }

    async fn query(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Rows> {
        MockSession::query(self, ctx, sql, args).await
    }

    async fn query_row(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<Row> {
        MockSession::query_row(self, ctx, sql, args).await
    }

    async fn exec(&self, ctx: &CallContext, sql: &str, args: Vec<Arg>) -> Result<CommandTag> {
        MockSession::exec(self, ctx, sql, args).await
    }

    async fn prepare(
        &self,
        ctx: &CallContext,
        name: &str,
        sql: &str,
    ) -> Result<PreparedStatement> {
        MockSession::prepare(self, ctx, name, sql).await
    }

    async fn deallocate(&self, ctx: &CallContext, name: &str) -> Result<()> {
        MockSession::deallocate(self, ctx, name).await
    }

    async fn deallocate_all(&self, ctx: &CallContext) -> Result<()> {
        MockSession::deallocate_all(self, ctx).await
    }

    async fn copy_from(
        &self,
        ctx: &CallContext,
        table: &[&str],
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<i64> {
        MockSession::copy_from(self, ctx, table, columns, rows).await
    }

    async fn send_batch(&self, ctx: &CallContext, batch: &Batch) -> Result<BatchResults> {
        MockSession::send_batch(self, ctx, batch).await
    }

    async fn begin(&self, ctx: &CallContext) -> Result<()> {
        MockSession::begin(self, ctx).await
    }

    async fn begin_tx(&self, ctx: &CallContext, options: TxOptions) -> Result<()> {
        MockSession::begin_tx(self, ctx, options).await
    }

    async fn commit(&self, ctx: &CallContext) -> Result<()> {
        MockSession::commit(self, ctx).await
    }

    async fn rollback(&self, ctx: &CallContext) -> Result<()> {
        MockSession::rollback(self, ctx).await
    }

    async fn close(&self, ctx: &CallContext) -> Result<()> {
        MockSession::close(self, ctx).await
    }
}
