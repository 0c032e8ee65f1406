//! Query rewriting arguments.
//!
//! Some arguments transform the statement they are passed with before it is
//! executed: named arguments turn `@name` placeholders into positional ones,
//! and application types can build their own SQL and argument list. The
//! engine compares expectations against the rewritten form, and an
//! expectation can additionally assert the rewritten SQL text with
//! [`Expectation::with_rewritten_sql`](crate::Expectation::with_rewritten_sql).

use std::fmt;

use sqlmock_types::{NamedArgs, SqlValue};
use thiserror::Error;

/// A rewriter refused to rewrite a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RewriteError(pub String);

/// An argument that rewrites the statement it is passed with.
pub trait QueryRewriter: Send + Sync + fmt::Debug {
    /// Produce the effective SQL and positional arguments for `sql`.
    ///
    /// # Errors
    ///
    /// Returns a [`RewriteError`] if the statement cannot be rewritten.
    fn rewrite_query(&self, sql: &str) -> Result<(String, Vec<SqlValue>), RewriteError>;
}

impl QueryRewriter for NamedArgs {
    fn rewrite_query(&self, sql: &str) -> Result<(String, Vec<SqlValue>), RewriteError> {
        Ok(self.rewrite(sql))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct User {
        id: i64,
        name: &'static str,
    }

    impl QueryRewriter for User {
        fn rewrite_query(&self, sql: &str) -> Result<(String, Vec<SqlValue>), RewriteError> {
            match sql {
                "INSERT" => Ok((
                    "INSERT INTO users (username) VALUES ($1) RETURNING id".into(),
                    vec![self.name.into()],
                )),
                "DELETE" => Ok(("DELETE FROM users WHERE id = $1".into(), vec![self.id.into()])),
                other => Err(RewriteError(format!("unsupported statement {other}"))),
            }
        }
    }

    #[test]
    fn test_named_args_rewrite() {
        let args = NamedArgs::new().arg("id", 3);
        let (sql, values) = args.rewrite_query("SELECT * FROM t WHERE id = @id").unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id = $1");
        assert_eq!(values, vec![SqlValue::Int(3)]);
    }

    #[test]
    fn test_custom_rewriter() {
        let user = User { id: 9, name: "John" };
        let (sql, values) = user.rewrite_query("DELETE").unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE id = $1");
        assert_eq!(values, vec![SqlValue::BigInt(9)]);
        assert!(user.rewrite_query("UPSERT").is_err());
    }
}
