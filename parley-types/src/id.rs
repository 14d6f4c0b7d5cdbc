//! Request identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlates a submitted prompt with the events pushed for it.
///
/// Allocated by the remote side. Unique only among the requests that are
/// outstanding for one model instance at the same time; nothing else about
/// freshness or ordering is promised.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Wrap a raw identifier.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
