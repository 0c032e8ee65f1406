//! # sqlmock-types
//!
//! Value containers exchanged between the `sqlmock` expectation engine,
//! the mocked session surface and the code under test.
//!
//! Nothing in this crate performs I/O. The types are deliberately plain:
//! arguments and row cells are [`SqlValue`]s, named parameters are
//! [`NamedArgs`], exec results are [`CommandTag`]s and query results are
//! [`Rows`].
//!
//! ## Features
//!
//! - `chrono` (default): date/time values via chrono
//! - `uuid` (default): UUID values
//! - `decimal` (default): decimal values via rust_decimal
//! - `json`: JSON values via serde_json
//!
//! ## Example
//!
//! ```rust
//! use sqlmock_types::{CommandTag, NamedArgs, Rows, SqlValue};
//!
//! let tag = CommandTag::new("INSERT", 15);
//! assert_eq!(tag.to_string(), "INSERT 15");
//! assert_eq!(tag.rows_affected(), 15);
//!
//! let args = NamedArgs::new().arg("id", 7).arg("name", "alice");
//! let (sql, values) = args.rewrite("SELECT * FROM users WHERE id = @id");
//! assert_eq!(sql, "SELECT * FROM users WHERE id = $1");
//! assert_eq!(values, vec![SqlValue::Int(7)]);
//!
//! let mut rows = Rows::new(["id", "name"]);
//! rows.add_row(vec![1.into(), "alice".into()])?;
//! assert_eq!(rows.len(), 1);
//! # Ok::<(), sqlmock_types::TypeError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod command_tag;
pub mod error;
pub mod named;
pub mod rows;
pub mod value;

pub use command_tag::CommandTag;
pub use error::TypeError;
pub use named::NamedArgs;
pub use rows::{Row, Rows};
pub use value::{SqlValue, ValueKind};
