//! Expectation modifiers and the operation surface of the mock session.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use sqlmock::{
    Arg, ArgMatcher, Batch, BatchElement, BatchResults, CallContext, CommandTag, EqualMatcher,
    Error, ExpectedBatch, IsolationLevel, MockConfig, MockSession, NamedArgs, QueryRewriter,
    RewriteError, Rows, SqlValue, TxOptions, ValueKind, any_arg, any_of, named,
};

fn ctx() -> CallContext {
    CallContext::background()
}

// =============================================================================
// Repeat and Optional Modifiers
// =============================================================================

#[tokio::test]
async fn test_times_requires_every_call() {
    let mock = MockSession::new();
    mock.expect_ping().times(2);

    mock.ping(&ctx()).await.unwrap();
    assert!(mock.expectations_were_met().is_err());
    mock.ping(&ctx()).await.unwrap();
    mock.expectations_were_met().unwrap();

    let err = mock.ping(&ctx()).await.unwrap_err();
    assert!(err.is_unmatched());
}

#[tokio::test]
async fn test_single_use_expectation_saturates() {
    let mock = MockSession::new();
    let e = mock.expect_exec("^DELETE");
    assert!(mock.expectations_were_met().is_err());

    mock.exec(&ctx(), "DELETE FROM t", vec![]).await.unwrap();
    mock.expectations_were_met().unwrap();
    assert!(e.is_saturated());

    assert!(mock.exec(&ctx(), "DELETE FROM t", vec![]).await.is_err());
    assert_eq!(e.calls(), 1);
}

#[tokio::test]
async fn test_maybe_expectations_may_be_skipped() {
    let mock = MockSession::new();
    mock.expect_ping().maybe();
    mock.expect_begin().maybe();
    mock.expect_query("SET TIME ZONE 'Europe/Rome'").maybe();
    let tag = CommandTag::from_raw("SELECT 1");
    mock.expect_exec("select").will_return_result(tag.clone());
    mock.expect_commit().maybe();

    let res = mock.exec(&ctx(), "select version()", vec![]).await.unwrap();
    assert_eq!(res, tag);
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_at_least_and_at_most() {
    let mock = MockSession::new();
    let heartbeat = mock.expect_ping();
    heartbeat.at_least(2);
    let cleanup = mock.expect_exec("^VACUUM");
    cleanup.at_most(2);

    mock.expectations_were_met().unwrap_err();
    for _ in 0..5 {
        mock.ping(&ctx()).await.unwrap();
    }
    mock.expectations_were_met().unwrap();
    assert_eq!(heartbeat.calls(), 5);

    mock.exec(&ctx(), "VACUUM", vec![]).await.unwrap();
    mock.exec(&ctx(), "VACUUM", vec![]).await.unwrap();
    assert!(mock.exec(&ctx(), "VACUUM", vec![]).await.is_err());
}

#[tokio::test]
async fn test_unmet_expectations_are_listed() {
    let mock = MockSession::new();
    mock.expect_ping();
    mock.expect_commit().maybe();
    mock.expect_rollback();

    let unmet = mock.unmet_expectations();
    assert_eq!(unmet.len(), 2);
    assert_eq!(mock.expectation_count(), 3);

    let Err(Error::Unmet(err)) = mock.expectations_were_met() else {
        panic!("expected unmet expectations");
    };
    assert_eq!(
        err.to_string(),
        "there are 2 remaining expectations which were not matched:\n\
         ExpectedPing => expecting call to ping()\n\
         ExpectedRollback => expecting call to rollback()\n"
    );
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("no ping please")]
struct NoPing;

#[tokio::test(start_paused = true)]
async fn test_configured_errors_are_verbatim() {
    let mock = MockSession::new();
    mock.expect_ping()
        .will_delay_for(Duration::from_secs(1))
        .will_return_error(NoPing);
    mock.expect_query("SELECT").will_return_error("oops");

    let err = mock.ping(&ctx()).await.unwrap_err();
    assert!(err.is_configured());
    assert!(err.configured().unwrap().downcast_ref::<NoPing>().is_some());

    let err = mock.query_row(&ctx(), "SELECT 1", vec![]).await.unwrap_err();
    assert_eq!(err.to_string(), "oops");
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_configured_panic_unwinds() {
    let mock = MockSession::new();
    let e = mock.expect_ping();
    e.will_panic("i'm tired");
    assert!(e.to_string().contains("panics with: i'm tired"));

    let session = mock.clone();
    let join = tokio::spawn(async move { session.ping(&CallContext::background()).await });
    let err = join.await.unwrap_err();
    assert!(err.is_panic());
    let payload = err.into_panic();
    assert_eq!(payload.downcast_ref::<String>().unwrap(), "i'm tired");

    // The call was claimed before unwinding.
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_query_row_returns_first_row() {
    let mock = MockSession::new();
    let rows = Rows::new(["One", "Two", "Three"])
        .with_row(vec![
            "ValueOne".into(),
            2.into(),
            vec![SqlValue::from("Three"), SqlValue::from("Four")].into(),
        ])
        .unwrap();
    mock.expect_query("FROM user").will_return_rows(rows);

    let row = mock
        .query_row(&ctx(), "SELECT name FROM user WHERE name = 'John'", vec![])
        .await
        .unwrap();
    assert_eq!(row.get(0).and_then(SqlValue::as_str), Some("ValueOne"));
    assert_eq!(row.get_by_name("Two").and_then(SqlValue::as_i64), Some(2));
    assert_eq!(row.get(2).and_then(SqlValue::as_array).map(<[_]>::len), Some(2));
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_build_query_with_equal_matcher() {
    let mock = MockSession::with_config(MockConfig::new().query_matcher(EqualMatcher));
    let query = "
        SELECT
            name,
            email
        FROM user
        where
            name    = 'John'
    ";

    mock.expect_query(query).will_return_error("oops");
    mock.expect_exec(query).will_return_result(CommandTag::new("SELECT", 1));
    mock.expect_prepare("foo", query);

    assert!(mock.query_row(&ctx(), query, vec![]).await.is_err());
    let tag = mock
        .exec(&ctx(), "SELECT name, email FROM user where name = 'John'", vec![])
        .await
        .unwrap();
    assert!(tag.is_select());
    let stmt = mock.prepare(&ctx(), "foo", query).await.unwrap();
    assert_eq!(stmt.name(), "foo");
    mock.expectations_were_met().unwrap();
}

// =============================================================================
// Delay and Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_delay_with_cancelled_context() {
    let mock = MockSession::new();
    mock.expect_ping()
        .will_delay_for(Duration::from_secs(1))
        .maybe()
        .times(4);

    let cancelled = CallContext::background();
    cancelled.cancel();
    let err = mock.ping(&cancelled).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    mock.expectations_were_met().unwrap();

    let start = tokio::time::Instant::now();
    mock.ping(&ctx()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(1));
    mock.expectations_were_met().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_delay_with_deadline() {
    let mock = MockSession::new();
    mock.expect_query("^SELECT")
        .will_delay_for(Duration::from_secs(5))
        .will_return_rows(Rows::new(["id"]));

    let ctx = CallContext::with_timeout(Duration::from_millis(100));
    let err = mock.query(&ctx, "SELECT id FROM t", vec![]).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(err.is_cancellation());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_delay() {
    let mock = MockSession::new();
    mock.expect_exec("^UPDATE")
        .will_delay_for(Duration::from_secs(30))
        .will_return_result(CommandTag::new("UPDATE", 3));

    let ctx = CallContext::background();
    let child = ctx.child();
    let session = mock.clone();
    let call =
        tokio::spawn(async move { session.exec(&child, "UPDATE t SET a = 1", vec![]).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    ctx.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_delay_waits_for_cancellation() {
    let mock = MockSession::new();
    mock.expect_ping().will_delay_for(Duration::MAX);

    let ctx = CallContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = mock.ping(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    mock.expectations_were_met().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_timeout_does_not_expire() {
    let mock = MockSession::new();
    mock.expect_ping().will_delay_for(Duration::from_secs(1));

    let ctx = CallContext::with_timeout(Duration::MAX);
    assert!(ctx.deadline().is_none());
    mock.ping(&ctx).await.unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_describe_exec() {
    let mock = MockSession::new();
    let ex = mock.expect_exec("^INSERT (.+)");
    ex.will_return_result(CommandTag::new("INSERT", 15))
        .will_delay_for(Duration::from_secs(1))
        .maybe()
        .times(2);

    assert_eq!(
        ex.to_string(),
        "ExpectedExec => expecting call to exec():\n\
         \t- matches sql: '^INSERT (.+)'\n\
         \t- is without arguments\n\
         \t- returns result: INSERT 15\n\
         \t- delayed execution for: 1s\n\
         \t- execution is optional\n\
         \t- execution calls awaited: 2\n"
    );
    let res = mock.exec(&ctx(), "INSERT something", vec![]).await.unwrap();
    assert_eq!(res.to_string(), "INSERT 15");

    ex.with_args([42]);
    assert_eq!(
        ex.to_string(),
        "ExpectedExec => expecting call to exec():\n\
         \t- matches sql: '^INSERT (.+)'\n\
         \t- is with arguments:\n\
         \t\t0 - 42\n\
         \t- returns result: INSERT 15\n\
         \t- delayed execution for: 1s\n\
         \t- execution is optional\n\
         \t- execution calls awaited: 2\n"
    );
    let res = mock
        .exec(&ctx(), "INSERT something", vec![42.into()])
        .await
        .unwrap();
    assert_eq!(res.to_string(), "INSERT 15");
    assert_eq!(ex.calls(), 2);
}

// =============================================================================
// Arguments
// =============================================================================

#[tokio::test]
async fn test_missing_with_args() {
    let mock = MockSession::new();
    mock.expect_exec("INSERT something");

    let err = mock
        .exec(&ctx(), "INSERT something", vec!["something".into()])
        .await
        .unwrap_err();
    assert!(err.is_unmatched());
    assert!(err.to_string().contains("arguments do not match"));
    assert!(mock.expectations_were_met().is_err());
}

#[tokio::test]
async fn test_missing_with_args_rejects_named_args() {
    let mock = MockSession::new();
    mock.expect_exec("^DELETE");

    let err = mock
        .exec(
            &ctx(),
            "DELETE FROM t",
            vec![NamedArgs::new().arg("id", 1).into()],
        )
        .await
        .unwrap_err();
    assert!(err.is_unmatched());
    assert!(err.to_string().contains("expected 0 arguments, got 1"));
    assert!(mock.expectations_were_met().is_err());
}

#[tokio::test]
async fn test_wildcard_accepts_any_type() {
    let mock = MockSession::new();
    mock.expect_exec("^INSERT").with_args([any_arg()]).times(3);

    mock.exec(&ctx(), "INSERT", vec![1.into()]).await.unwrap();
    mock.exec(&ctx(), "INSERT", vec!["one".into()]).await.unwrap();
    mock.exec(&ctx(), "INSERT", vec![true.into()]).await.unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_typed_wildcard() {
    let mock = MockSession::new();
    mock.expect_exec("^INSERT")
        .with_args([any_of(ValueKind::String), 7.into()])
        .at_least(1);

    mock.exec(&ctx(), "INSERT", vec!["x".into(), 7.into()])
        .await
        .unwrap();
    let err = mock
        .exec(&ctx(), "INSERT", vec![1.into(), 7.into()])
        .await
        .unwrap_err();
    assert!(err.is_unmatched());
}

#[tokio::test]
async fn test_named_args_missing_key() {
    let mock = MockSession::new();
    mock.expect_query("^SELECT").with_args([named([("id", any_arg())])]);

    let err = mock
        .query(
            &ctx(),
            "SELECT * FROM users WHERE email = @email",
            vec![NamedArgs::new().arg("email", "a@b").into()],
        )
        .await
        .unwrap_err();
    assert!(err.is_unmatched());
    assert!(err.to_string().contains("named argument 'id' is missing"));

    mock.query(
        &ctx(),
        "SELECT * FROM users WHERE id = @id",
        vec![NamedArgs::new().arg("id", 3).into()],
    )
    .await
    .unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_query_rewriter_with_configured_error() {
    let mock = MockSession::with_config(MockConfig::new().query_matcher(EqualMatcher));
    let update = r#"UPDATE "user" SET email = @email, password = @password, updated_utc = @updated_utc WHERE id = @id"#;

    mock.expect_exec(update)
        .with_args([named([
            ("id", ArgMatcher::from("mockUser.ID")),
            ("email", "mockUser.Email".into()),
            ("password", "mockUser.Password".into()),
            ("updated_utc", any_arg()),
        ])])
        .will_return_error("boom");

    let err = mock
        .exec(
            &ctx(),
            update,
            vec![
                NamedArgs::new()
                    .arg("id", "mockUser.ID")
                    .arg("email", "mockUser.Email")
                    .arg("password", "mockUser.Password")
                    .arg("updated_utc", 1_760_745_600i64)
                    .into(),
            ],
        )
        .await
        .unwrap_err();
    assert!(err.is_configured());
    mock.expectations_were_met().unwrap();
}

#[derive(Debug, Clone)]
struct User {
    id: i64,
    name: &'static str,
    email: Option<&'static str>,
}

impl QueryRewriter for User {
    fn rewrite_query(&self, sql: &str) -> Result<(String, Vec<SqlValue>), RewriteError> {
        match sql {
            "INSERT" => Ok((
                "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id".into(),
                vec![self.name.into(), self.email.into()],
            )),
            "DELETE" => Ok(("DELETE FROM users WHERE id = $1".into(), vec![self.id.into()])),
            other => Err(RewriteError(format!("unsupported statement {other}"))),
        }
    }
}

#[tokio::test]
async fn test_with_rewritten_sql() {
    let mock = MockSession::with_config(MockConfig::new().query_matcher(EqualMatcher));
    let john = User {
        id: 1,
        name: "John",
        email: Some("john@example.com"),
    };

    mock.expect_query("INSERT")
        .with_args([ArgMatcher::Rewriter(Arc::new(john.clone()))])
        .with_rewritten_sql("INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id");
    mock.query(&ctx(), "INSERT", vec![Arg::rewriter(john)])
        .await
        .unwrap();
    mock.expectations_were_met().unwrap();

    mock.expect_query("INSERT INTO users(username, password) VALUES (@user, @password)")
        .with_args([NamedArgs::new().arg("user", "John").arg("password", "strong")])
        .with_rewritten_sql("INSERT INTO users(username, password) VALUES ($1)");
    let err = mock
        .query(
            &ctx(),
            "INSERT INTO users(username) VALUES (@user)",
            vec![NamedArgs::new().arg("user", "John").arg("password", "strong").into()],
        )
        .await
        .unwrap_err();
    assert!(err.is_unmatched());
    assert!(mock.expectations_were_met().is_err());
}

#[tokio::test]
async fn test_rewriter_against_positional_args() {
    let mock = MockSession::new();
    let jane = User {
        id: 9,
        name: "Jane",
        email: None,
    };
    mock.expect_exec("^DELETE").with_args([9i64]);

    mock.exec(&ctx(), "DELETE", vec![Arg::rewriter(jane.clone())])
        .await
        .unwrap();

    mock.expect_exec("^UPDATE").with_args([any_arg()]);
    let err = mock
        .exec(&ctx(), "UPDATE", vec![Arg::rewriter(jane)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported statement UPDATE"));
}

// =============================================================================
// Prepare, Copy and Batch
// =============================================================================

#[tokio::test]
async fn test_unexpected_calls() {
    let mock = MockSession::new();
    assert!(mock.ping(&ctx()).await.is_err());
    assert!(mock.prepare(&ctx(), "foo", "bar").await.is_err());
    assert!(
        mock.copy_from(&ctx(), &["schema", "table"], &["foo", "bar"], &[])
            .await
            .is_err()
    );

    mock.expect_exec("foo");
    assert!(mock.ping(&ctx()).await.is_err());
    assert!(mock.prepare(&ctx(), "foo", "bar").await.is_err());
    let err = mock
        .copy_from(&ctx(), &["schema", "table"], &["foo", "bar"], &[])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "call to copy_from([\"schema\", \"table\"], [\"foo\", \"bar\"], 0 rows) was not \
         expected: all expectations were already fulfilled"
    );
}

#[tokio::test]
async fn test_prepare_and_deallocate() {
    let mock = MockSession::new();
    mock.expect_prepare("get_user", "^SELECT .+ FROM users");
    mock.expect_deallocate("get_user");
    mock.expect_deallocate_all();

    let stmt = mock
        .prepare(&ctx(), "get_user", "SELECT * FROM users WHERE id = $1")
        .await
        .unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = $1");
    assert!(mock.deallocate(&ctx(), "other").await.is_err());
    mock.deallocate(&ctx(), "get_user").await.unwrap();
    mock.deallocate_all(&ctx()).await.unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_copy_from() {
    let mock = MockSession::new();
    mock.expect_copy_from(["foo"], ["bar"]).will_return_copied(1);
    mock.expect_copy_from(["fooschema", "baztable"], ["col1"]);

    let rows = vec![vec![SqlValue::from("baz")]];
    let copied = mock.copy_from(&ctx(), &["foo"], &["bar"], &rows).await.unwrap();
    assert_eq!(copied, 1);

    let err = mock
        .copy_from(&ctx(), &["fooschema", "baztable"], &["col2"], &rows)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("columns"));
    let source = [rows[0].clone(), rows[0].clone()];
    let copied = mock
        .copy_from(&ctx(), &["fooschema", "baztable"], &["col1"], &source)
        .await
        .unwrap();
    assert_eq!(copied, 2);
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_send_batch() {
    let mock = MockSession::with_config(MockConfig::new());
    let create = "
        CREATE TABLE IF NOT EXISTS user (
            id text,
            name text
        )
    ";
    let query = "
        SELECT name
        FROM user
        WHERE name = 'John'
    ";

    mock.expect_send_batch(
        ExpectedBatch::new()
            .element(
                BatchElement::new("CREATE TABLE *").with_args([1.into(), ArgMatcher::from("aaa")]),
            )
            .element(BatchElement::new("SELECT *")),
    )
    .will_return_batch(
        BatchResults::new()
            .with_exec(CommandTag::new("CREATE TABLE", 0))
            .with_rows(Rows::new(["name"]).with_row(vec!["John".into()]).unwrap()),
    );

    let mut batch = Batch::new();
    batch
        .queue(create, vec![1.into(), "aaa".into()])
        .queue(query, vec![]);

    let mut results = mock.send_batch(&ctx(), &batch).await.unwrap();
    assert_eq!(results.exec().unwrap().as_str(), "CREATE TABLE 0");
    let row = results.query_row().unwrap();
    assert_eq!(row.get(0), Some(&SqlValue::from("John")));
    results.close().unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_send_batch_shape_mismatch() {
    let mock = MockSession::new();
    mock.expect_send_batch(ExpectedBatch::new().element(BatchElement::new("^INSERT")));

    let mut batch = Batch::new();
    batch
        .queue("INSERT INTO t VALUES (1)", vec![])
        .queue("INSERT INTO t VALUES (2)", vec![]);
    let err = mock.send_batch(&ctx(), &batch).await.unwrap_err();
    assert!(err.to_string().contains("batch has 2 statements, expected 1"));
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_transaction_flow() {
    let mock = MockSession::new();
    mock.expect_begin();
    mock.expect_exec("^UPDATE").with_args([any_arg(), 2.into()]);
    mock.expect_commit();

    mock.begin(&ctx()).await.unwrap();
    mock.exec(
        &ctx(),
        "UPDATE products SET views = $1 WHERE id = $2",
        vec![5.into(), 2.into()],
    )
    .await
    .unwrap();
    mock.commit(&ctx()).await.unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_begin_tx_options() {
    let mock = MockSession::new();
    let serializable = TxOptions::new().isolation(IsolationLevel::Serializable);
    mock.expect_begin_tx(serializable);
    mock.expect_rollback().will_return_error("connection reset");

    let err = mock.begin(&ctx()).await.unwrap_err();
    assert!(err.to_string().contains("ISOLATION LEVEL SERIALIZABLE"));
    mock.begin_tx(&ctx(), serializable).await.unwrap();
    assert!(mock.rollback(&ctx()).await.unwrap_err().is_configured());
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_close() {
    let mock = MockSession::new();
    mock.expect_close();
    mock.close(&ctx()).await.unwrap();
    assert!(mock.close(&ctx()).await.is_err());
    mock.expectations_were_met().unwrap();
}
