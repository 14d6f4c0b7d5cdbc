//! In-flight request registry for one model instance.

use parley_types::{RequestId, StreamError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Action that stops one request on the remote side.
pub type CancelFn = Box<dyn FnOnce() -> Result<(), StreamError> + Send + 'static>;

/// Outcome of [`RequestRegistry::cancel_all`].
#[derive(Debug, Default)]
pub struct CancelReport {
    /// Cancellation actions invoked.
    pub attempted: usize,
    /// Actions that failed, with the request they belonged to.
    pub failures: Vec<(RequestId, StreamError)>,
}

impl CancelReport {
    /// Whether every attempted cancellation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Maps each outstanding request to the action that cancels it.
///
/// An entry leaves the registry exactly once, either through
/// [`cancel_one`](Self::cancel_one) / [`cancel_all`](Self::cancel_all)
/// (the action runs) or through [`complete`](Self::complete) (it does
/// not). Actions always run after the lock is released, so an action may
/// call back into the registry.
pub struct RequestRegistry {
    entries: Mutex<HashMap<RequestId, CancelFn>>,
}

impl RequestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<RequestId, CancelFn>> {
        // A panicking action never runs under the lock, so the map is intact.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `id`. A colliding id replaces the previous action.
    pub fn register<F>(&self, id: RequestId, cancel: F)
    where
        F: FnOnce() -> Result<(), StreamError> + Send + 'static,
    {
        let replaced = self.entries().insert(id, Box::new(cancel)).is_some();
        if replaced {
            tracing::warn!(request_id = %id, "request id reused while still outstanding");
        } else {
            tracing::debug!(request_id = %id, "registered request");
        }
    }

    /// Cancel and forget `id`.
    ///
    /// Returns `Ok(false)` when `id` is not registered (already completed
    /// or cancelled); that case is logged, never an error.
    pub fn cancel_one(&self, id: RequestId) -> Result<bool, StreamError> {
        let entry = self.entries().remove(&id);
        match entry {
            Some(cancel) => {
                tracing::debug!(request_id = %id, "cancelling request");
                cancel().map(|()| true)
            }
            None => {
                tracing::debug!(error = %StreamError::UnknownRequest(id), "cancel ignored");
                Ok(false)
            }
        }
    }

    /// Forget `id` without cancelling it. Returns whether it was present.
    pub fn complete(&self, id: RequestId) -> bool {
        let removed = self.entries().remove(&id).is_some();
        if removed {
            tracing::debug!(request_id = %id, "request completed");
        }
        removed
    }

    /// Cancel and forget every request.
    ///
    /// Every action runs even when earlier ones fail; failures are
    /// collected into the report.
    pub fn cancel_all(&self) -> CancelReport {
        let drained: Vec<(RequestId, CancelFn)> = self.entries().drain().collect();
        let mut report = CancelReport::default();
        for (id, cancel) in drained {
            report.attempted += 1;
            if let Err(e) = cancel() {
                if e.is_fatal() {
                    tracing::warn!(request_id = %id, error = %e, "cancellation failed");
                } else {
                    tracing::debug!(request_id = %id, error = %e, "cancellation ignored");
                }
                report.failures.push((id, e));
            }
        }
        report
    }

    /// Whether `id` is outstanding.
    pub fn contains(&self, id: RequestId) -> bool {
        self.entries().contains_key(&id)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Outstanding ids, in no particular order.
    pub fn ids(&self) -> Vec<RequestId> {
        self.entries().keys().copied().collect()
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRegistry")
            .field("outstanding", &self.ids())
            .finish()
    }
}
