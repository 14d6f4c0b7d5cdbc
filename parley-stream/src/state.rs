//! Per-request lifecycle.

use std::sync::{Arc, Mutex, PoisonError};

/// Where a request is in its lifecycle.
///
/// `Submitted → Active → {Completed | Cancelled | Errored}`. Any
/// non-terminal state may move straight to a terminal one (a request can
/// be cancelled, fail, or be stopped before its first record). Terminal
/// states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Handed to the transport, no record seen yet.
    Submitted,
    /// At least one record delivered.
    Active,
    /// Ended normally.
    Completed,
    /// Ended by cancellation.
    Cancelled,
    /// Ended by an error.
    Errored,
}

impl RequestState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Cancelled | RequestState::Errored
        )
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_advance_to(self, next: RequestState) -> bool {
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (RequestState::Submitted, RequestState::Active) => true,
            (_, to) => to.is_terminal(),
        }
    }
}

/// Shared, observable [`RequestState`].
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<Mutex<RequestState>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(RequestState::Submitted)))
    }

    pub(crate) fn get(&self) -> RequestState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` if legal. Returns whether the state changed.
    pub(crate) fn advance(&self, next: RequestState) -> bool {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if state.can_advance_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }
}
