//! The two transport boundaries: pulled byte chunks and pushed events.

use crate::{error::StreamError, id::RequestId, message::ChatResponse, message::PromptRequest};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// An ordered source of byte chunks with an explicit end.
///
/// The reader pulls with [`next_chunk`](ChunkSource::next_chunk) until it
/// returns `None`, and calls [`release`](ChunkSource::release) once it is
/// done reading, for whatever reason. Implementations must treat a second
/// release as a no-op.
#[async_trait]
pub trait ChunkSource: Send {
    /// The next chunk, a transport failure, or `None` at end of stream.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, StreamError>>;

    /// Release the underlying resources (close the body, cancel the read).
    fn release(&mut self);
}

#[async_trait]
impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, StreamError>> {
        (**self).next_chunk().await
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// An event pushed by the remote side for one request.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum PromptEvent {
    /// A response record. `done = true` closes the request.
    Message(ChatResponse),
    /// The remote side stopped producing for this request.
    Stopped,
    /// The remote side failed while producing.
    Failed(String),
}

/// What a successful submission hands back.
#[derive(Debug)]
pub struct Submission {
    /// Identifier to correlate and stop this request.
    pub id: RequestId,
    /// Events for this request, in production order.
    pub events: mpsc::Receiver<PromptEvent>,
}

/// A host that runs prompts and pushes their events back.
///
/// `stop` is fire-and-forget: returning `Ok` means the request was asked to
/// stop, not that the remote side acknowledged it.
#[async_trait]
pub trait PromptTransport: Send + Sync {
    /// Submit a prompt and get its identifier plus event channel.
    async fn submit(&self, request: PromptRequest) -> Result<Submission, StreamError>;

    /// Ask the remote side to stop producing for `id`.
    fn stop(&self, id: RequestId) -> Result<(), StreamError>;

    /// Load a model into memory ahead of use.
    async fn load(&self, model: &str) -> Result<(), StreamError>;

    /// Unload a model from memory.
    async fn unload(&self, model: &str) -> Result<(), StreamError>;
}
