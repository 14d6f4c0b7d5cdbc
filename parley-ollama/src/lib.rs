#![deny(missing_docs)]
//! Ollama backend for parley.
//!
//! [`OllamaClient`] talks to the HTTP API: streamed chat over NDJSON,
//! model load and unload, and a liveness probe. [`OllamaHost`] wraps a
//! client as a [`PromptTransport`](parley_types::PromptTransport), running
//! every prompt on its own task and pushing its records as events, so
//! [`ModelHandle`](parley_stream::ModelHandle) can track and stop them.
//!
//! Ollama runs locally; there is no authentication.

mod client;
mod error;
mod host;
mod types;

pub use client::OllamaClient;
pub use error::OllamaError;
pub use host::{DEFAULT_EVENT_CAPACITY, OllamaHost};
