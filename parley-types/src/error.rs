//! Error taxonomy shared by every stream in the workspace.

use crate::id::RequestId;
use thiserror::Error;

/// Errors that terminate (or, for [`StreamError::UnknownRequest`], merely
/// annotate) a response sequence.
///
/// Every variant is scoped to one sequence: none of them leave shared state
/// (the request registry, another sequence's buffer) inconsistent.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StreamError {
    /// Buffer growth would exceed the configured maximum.
    #[error("buffer overflow: {required} bytes required, maximum is {max}")]
    BufferOverflow {
        /// Bytes the buffer would need to hold.
        required: usize,
        /// Configured maximum capacity.
        max: usize,
    },

    /// A range outside the live bytes of a buffer was requested.
    #[error("invalid range {start}..{end} for buffer of length {length}")]
    InvalidRange {
        /// Requested start (inclusive).
        start: usize,
        /// Requested end (exclusive).
        end: usize,
        /// Live length of the buffer.
        length: usize,
    },

    /// One record could not be decoded. Not retried.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The underlying byte or event source failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Cancellation was issued for an id with no registry entry.
    /// Logged and ignored by the registry; never fatal.
    #[error("unknown request: {0}")]
    UnknownRequest(RequestId),

    /// The caller supplied input the operation cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    /// Whether this error ends the sequence it was raised on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StreamError::UnknownRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            StreamError::BufferOverflow {
                required: 5000,
                max: 4096
            }
            .to_string(),
            "buffer overflow: 5000 bytes required, maximum is 4096"
        );
        assert_eq!(
            StreamError::InvalidRange {
                start: 0,
                end: 9,
                length: 4
            }
            .to_string(),
            "invalid range 0..9 for buffer of length 4"
        );
        assert_eq!(
            StreamError::UnknownRequest(RequestId::new(7)).to_string(),
            "unknown request: 7"
        );
    }

    #[test]
    fn only_unknown_request_is_non_fatal() {
        assert!(!StreamError::UnknownRequest(RequestId::new(1)).is_fatal());
        assert!(StreamError::MalformedRecord("x".into()).is_fatal());
        assert!(StreamError::Transport("reset".into()).is_fatal());
        assert!(
            StreamError::BufferOverflow {
                required: 2,
                max: 1
            }
            .is_fatal()
        );
    }
}
