//! # parley-types — protocol types for streamed LLM responses
//!
//! This crate defines the record types and the two transport boundaries
//! that the rest of the workspace composes into one cancellable stream.
//!
//! ## The Boundaries
//!
//! | Transport | Trait | Shape |
//! |-----------|-------|-------|
//! | Byte stream | [`ChunkSource`] | Pull "next chunk or end", then release |
//! | Host events | [`PromptTransport`] | Submit returns a [`RequestId`] plus pushed [`PromptEvent`]s |
//!
//! Whatever the transport, consumers only ever see a sequence of
//! [`ChatResponse`] records whose last element has `done = true`, or a
//! typed [`StreamError`].
//!
//! ## Dependency Notes
//!
//! Byte chunks are [`bytes::Bytes`] because that is what HTTP clients hand
//! out; pushed events travel over a bounded `tokio::sync::mpsc` channel so
//! that a slow consumer applies backpressure to the producer.

#![deny(missing_docs)]

pub mod error;
pub mod id;
pub mod message;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports for convenience
pub use error::StreamError;
pub use id::RequestId;
pub use message::{ChatMessage, ChatResponse, PromptRequest, Role};
pub use transport::{ChunkSource, PromptEvent, PromptTransport, Submission};
