//! Basic expectation and verification example.
//!
//! A small repository function is tested against the mock session: the
//! test declares the transaction it expects, runs the function, and checks
//! that every expectation was met.
//!
//! # Running
//!
//! ```bash
//! cargo run -p sqlmock --example basic
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlmock::{CallContext, CommandTag, Error, MockSession, Rows, Session, any_arg};

/// Record a view of a product and return its new view count.
async fn record_view(
    session: &dyn Session,
    ctx: &CallContext,
    product: i32,
) -> Result<i64, Error> {
    session.begin(ctx).await?;
    let result = async {
        session
            .exec(
                ctx,
                "UPDATE products SET views = views + 1 WHERE id = $1",
                vec![product.into()],
            )
            .await?;
        let row = session
            .query_row(
                ctx,
                "SELECT views FROM products WHERE id = $1",
                vec![product.into()],
            )
            .await?;
        Ok::<_, Error>(row.get(0).and_then(|v| v.as_i64()).unwrap_or_default())
    }
    .await;

    match result {
        Ok(views) => {
            session.commit(ctx).await?;
            Ok(views)
        }
        Err(err) => {
            session.rollback(ctx).await?;
            Err(err)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let mock = MockSession::new();
    mock.expect_begin();
    mock.expect_exec("^UPDATE products")
        .with_args([any_arg()])
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_query("^SELECT views")
        .with_args([7])
        .will_return_rows(Rows::new(["views"]).with_row(vec![42i64.into()])?);
    mock.expect_commit();

    let ctx = CallContext::background();
    let views = record_view(&mock, &ctx, 7).await?;
    println!("product 7 now has {views} views");

    mock.expectations_were_met()?;
    println!("all expectations were met");

    // A failing statement rolls the transaction back.
    mock.expect_begin();
    mock.expect_exec("^UPDATE products")
        .with_args([any_arg()])
        .will_return_error("deadlock detected");
    mock.expect_rollback();

    let err = record_view(&mock, &ctx, 7).await.unwrap_err();
    println!("second call failed as configured: {err}");
    mock.expectations_were_met()?;

    Ok(())
}
