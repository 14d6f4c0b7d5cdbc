#![deny(missing_docs)]
//! Cancellable, request-correlated response streams for parley.
//!
//! Every answer a model produces, whether it arrives as NDJSON bytes or as
//! events pushed by a host process, is consumed as one [`PromptStream`].
//!
//! | Piece | What it does |
//! |-------|--------------|
//! | [`StreamAdapter`] | Turns a transport into [`PromptStream`]s |
//! | [`RequestRegistry`] | Tracks in-flight requests and how to stop them |
//! | [`RequestState`] | Per-request lifecycle, exposed on the stream |
//! | [`ModelHandle`] | One model: prompt, stop everything, load, unload |
//! | [`generate_title`] | Asks a model to name a conversation |
//! | [`prepend_assistant_context`] | Puts the default assistant persona in front of a history |
//!
//! ## Cancellation
//!
//! A push-transport request is registered before its first event is read.
//! It leaves the registry exactly once: on its own when the answer ends,
//! or through a single remote `stop` when the consumer drops the stream,
//! the cancellation token fires, or the model is unloaded. A cancelled
//! stream ends right away without waiting for the transport to acknowledge.
//! Cancelling a request that already ended does nothing.
//!
//! Deadlines are left to the caller: wrap consumption in
//! `tokio::time::timeout` and fire the same token.

pub mod adapter;
pub mod context;
pub mod model;
pub mod registry;
pub mod state;
pub mod title;

pub use adapter::{PromptStream, ResponseLine, StreamAdapter};
pub use context::prepend_assistant_context;
pub use model::{ModelHandle, PromptOptions};
pub use registry::{CancelFn, CancelReport, RequestRegistry};
pub use state::RequestState;
pub use title::generate_title;
pub use tokio_util::sync::CancellationToken;
