//! In-memory transports for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that script what a real backend would send and record
//! what the reader did with it.

mod chunked_source;
mod scripted_transport;

pub use chunked_source::ChunkedSource;
pub use scripted_transport::ScriptedTransport;

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
