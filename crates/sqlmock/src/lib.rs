//! # sqlmock
//!
//! Call-expectation and verification engine standing in for a SQL database
//! session in tests.
//!
//! A test declares, in advance, the calls the code under test is expected to
//! make: which operation, which SQL, which arguments, how many times, and
//! what each call should return. The code under test then runs against a
//! [`MockSession`], and the test finally verifies that every required
//! expectation was met.
//!
//! ## Features
//!
//! - **Pluggable matching**: regex (default) or whitespace-normalised
//!   equality for SQL text, or any [`QueryMatcher`]
//! - **Argument matching**: deep equality, wildcards, type-constrained
//!   wildcards, named arguments and custom predicates
//! - **Call modifiers**: repeat counts, optional expectations, delays that
//!   observe cancellation, configured errors and panics
//! - **Ordering modes**: per-kind ordered (default), unordered, or strict
//! - **Thread safety**: a session can be cloned into many tasks; claiming an
//!   expectation is atomic
//!
//! ## Resolution
//!
//! ```text
//! call -> Call descriptor -> queue scan (kind, saturation, order)
//!      -> QueryMatcher + ArgsComparator -> claim (calls += 1)
//!      -> delay -> panic | error | payload
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sqlmock::{CallContext, CommandTag, MockSession, any_arg};
//!
//! # tokio_test::block_on(async {
//! let mock = MockSession::new();
//! mock.expect_begin();
//! mock.expect_exec("^UPDATE products")
//!     .with_args([any_arg(), 7.into()])
//!     .will_return_result(CommandTag::new("UPDATE", 1));
//! mock.expect_commit();
//!
//! let ctx = CallContext::background();
//! mock.begin(&ctx).await?;
//! let tag = mock
//!     .exec(&ctx, "UPDATE products SET views = $1 WHERE id = $2", vec![10.into(), 7.into()])
//!     .await?;
//! assert_eq!(tag.rows_affected(), 1);
//! mock.commit(&ctx).await?;
//!
//! mock.expectations_were_met()?;
//! # Ok::<(), sqlmock::Error>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod args;
pub mod batch;
pub mod call;
pub mod config;
pub mod context;
pub mod error;
pub mod expectation;
pub mod matcher;
mod queue;
pub mod rewrite;
pub mod session;
pub mod transaction;

// Re-export commonly used types
pub use args::{
    Arg, ArgMatcher, Argument, ArgsComparator, ArgsMismatch, DefaultComparator, any_arg, any_of,
    custom, named,
};
pub use batch::{Batch, BatchElement, BatchResult, BatchResults, ExpectedBatch, QueuedQuery};
pub use call::{Call, CallTarget, ExpectationKind};
pub use config::{MatchOrder, MockConfig};
pub use context::CallContext;
pub use error::{Error, Result, SharedError, UnmetExpectations};
pub use expectation::{Expectation, Payload, Repeat, Response, Target};
pub use matcher::{EqualMatcher, MatchError, QueryMatcher, QueryMatcherFn, RegexMatcher};
pub use rewrite::{QueryRewriter, RewriteError};
pub use session::{MockSession, PreparedStatement, Session};
pub use sqlmock_types::{CommandTag, NamedArgs, Row, Rows, SqlValue, TypeError, ValueKind};
pub use transaction::{AccessMode, IsolationLevel, TxOptions};
