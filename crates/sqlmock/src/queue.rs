//! The expectation queue.
//!
//! Entries are kept in declaration order and never removed; a saturated
//! entry is skipped, an unmet one is reported by verification. Resolving a
//! call scans and claims under a single lock, so two concurrent calls can
//! never both claim the last use of an expectation.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::args::ArgsComparator;
use crate::call::{Call, ExpectationKind};
use crate::config::{MatchOrder, MockConfig};
use crate::error::{Error, Result, UnmetExpectations};
use crate::expectation::{Expectation, Target};
use crate::matcher::QueryMatcher;

#[derive(Debug)]
struct QueueState {
    entries: Vec<Expectation>,
    order: MatchOrder,
}

/// Declared expectations plus the strategies used to match calls to them.
#[derive(Debug)]
pub(crate) struct ExpectationQueue {
    state: Mutex<QueueState>,
    matcher: Arc<dyn QueryMatcher>,
    comparator: Arc<dyn ArgsComparator>,
}

impl ExpectationQueue {
    pub(crate) fn new(config: MockConfig) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: Vec::new(),
                order: config.match_order,
            }),
            matcher: config.query_matcher,
            comparator: config.args_comparator,
        }
    }

    /// Register a new expectation at the end of the queue.
    pub(crate) fn declare(&self, kind: ExpectationKind, target: Target) -> Expectation {
        let expectation = Expectation::new(kind, target);
        let mut state = self.state.lock();
        state.entries.push(expectation.clone());
        tracing::debug!(
            kind = %kind,
            position = state.entries.len() - 1,
            "expectation declared"
        );
        expectation
    }

    pub(crate) fn set_order(&self, order: MatchOrder) {
        self.state.lock().order = order;
    }

    pub(crate) fn order(&self) -> MatchOrder {
        self.state.lock().order
    }

    /// Find and claim the expectation satisfying `call`.
    ///
    /// In ordered modes a required entry that has not reached its minimum
    /// blocks every later entry: per kind in [`MatchOrder::PerKind`], across
    /// kinds in [`MatchOrder::Strict`].
    pub(crate) fn claim(&self, call: &Call) -> Result<Expectation> {
        let state = self.state.lock();
        let order = state.order;
        let mut first_rejection = None;

        for (position, entry) in state.entries.iter().enumerate() {
            if entry.kind() != call.kind {
                if order == MatchOrder::Strict && entry.is_pending() && !entry.is_saturated() {
                    return Err(unmatched(call, format!("next expectation is: {entry}")));
                }
                continue;
            }
            if entry.is_saturated() {
                continue;
            }

            match entry.accepts(call, self.matcher.as_ref(), self.comparator.as_ref()) {
                Ok(()) => {
                    let calls = entry.record_call();
                    tracing::debug!(
                        call = %call,
                        position,
                        calls,
                        "call matched expectation"
                    );
                    return Ok(entry.clone());
                }
                Err(reason) => {
                    tracing::trace!(
                        call = %call,
                        position,
                        reason = %reason,
                        "expectation rejected call"
                    );
                    if order.is_ordered() && entry.is_pending() {
                        return Err(unmatched(
                            call,
                            format!("{reason}, next expectation is: {entry}"),
                        ));
                    }
                    first_rejection.get_or_insert(reason);
                }
            }
        }

        Err(unmatched(
            call,
            first_rejection
                .unwrap_or_else(|| "all expectations were already fulfilled".to_owned()),
        ))
    }

    /// Every required expectation short of its minimum, in declaration
    /// order.
    pub(crate) fn unmet(&self) -> Vec<Expectation> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_pending())
            .cloned()
            .collect()
    }

    /// Fail with every unmet expectation's description.
    pub(crate) fn verify(&self) -> Result<()> {
        let unmet = self.unmet();
        if unmet.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = unmet.len(), "unmet expectations");
        Err(UnmetExpectations::new(unmet.iter().map(ToString::to_string).collect()).into())
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}

fn unmatched(call: &Call, reason: String) -> Error {
    Error::Unmatched {
        call: call.to_string(),
        reason,
    }
}
