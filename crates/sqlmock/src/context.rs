//! Per-call cancellation context.
//!
//! Every mocked operation takes a [`CallContext`]. The only place the engine
//! waits is the delay modifier, and that wait observes the context: a
//! cancelled token yields [`Error::Cancelled`], a passed deadline yields
//! [`Error::DeadlineExceeded`]. Matching itself is never interrupted.
//!
//! ## Example
//!
//! ```rust,ignore
//! let ctx = CallContext::background();
//! session.ping(&ctx).await?;
//!
//! let ctx = CallContext::with_timeout(Duration::from_millis(50));
//! assert!(session.ping(&ctx).await.unwrap_err().is_cancellation());
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Cancellation token plus optional deadline carried by a call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context whose deadline is `timeout` from now. A timeout too large
    /// to represent leaves the context without a deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context with an absolute deadline.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A child context: cancelled with its parent, cancellable on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wait for `delay`, returning early if the context ends first.
    ///
    /// An already-cancelled context fails immediately even when `delay` is
    /// zero.
    pub(crate) async fn sleep(&self, delay: Duration) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        // An unrepresentable wake time never fires; only the context ends it.
        let wake = Instant::now().checked_add(delay);
        match (self.deadline, wake) {
            (Some(deadline), Some(wake)) if deadline > wake => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Err(Error::Cancelled),
                    () = tokio::time::sleep_until(wake) => Ok(()),
                }
            }
            (Some(deadline), _) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Err(Error::Cancelled),
                    () = tokio::time::sleep_until(deadline) => Err(Error::DeadlineExceeded),
                }
            }
            (None, Some(wake)) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Err(Error::Cancelled),
                    () = tokio::time::sleep_until(wake) => Ok(()),
                }
            }
            (None, None) => {
                self.token.cancelled().await;
                Err(Error::Cancelled)
            }
        }
    }
}
