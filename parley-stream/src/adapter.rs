//! One cancellable response stream, whatever the transport.

use crate::registry::RequestRegistry;
use crate::state::{RequestState, StateCell};
use futures::Stream;
use parley_ndjson::{BufferConfig, NdjsonDecoder};
use parley_types::{
    ChatResponse, ChunkSource, PromptEvent, PromptRequest, PromptTransport, RequestId,
    StreamError,
};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

type BoxedRecords = Pin<Box<dyn Stream<Item = Result<ChatResponse, StreamError>> + Send>>;

/// A lazy sequence of response records.
///
/// Ends in one of three ways:
/// - normally, right after the record with `done = true`;
/// - by cancellation (token fired), with no further item and no error;
/// - with one `Err` item, after which nothing follows.
///
/// Dropping the stream before it ended cancels the request.
pub struct PromptStream {
    id: Option<RequestId>,
    state: StateCell,
    inner: BoxedRecords,
}

impl PromptStream {
    /// The correlation id, for streams backed by a push transport.
    pub fn request_id(&self) -> Option<RequestId> {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    /// Concatenate the content of every record.
    ///
    /// Any error discards the partial text.
    pub async fn collect_text(mut self) -> Result<String, StreamError> {
        use futures::StreamExt;

        let mut text = String::new();
        while let Some(record) = self.next().await {
            text.push_str(&record?.message.content);
        }
        Ok(text)
    }
}

/// One decoded line of a byte-stream response.
///
/// Backends that report failures in-band (a line carrying an error
/// instead of a record) implement this for their own line type.
pub trait ResponseLine: DeserializeOwned {
    /// The record this line carries, or the error it reports.
    fn into_record(self) -> Result<ChatResponse, StreamError>;
}

impl ResponseLine for ChatResponse {
    fn into_record(self) -> Result<ChatResponse, StreamError> {
        Ok(self)
    }
}

impl PromptStream {
    /// Stream records decoded from a newline-delimited JSON byte source.
    ///
    /// The source is released right after the `done` record, on error, on
    /// cancellation, or when the stream is dropped. A source that ends
    /// without a `done` record fails with [`StreamError::Transport`].
    pub fn from_chunks<S>(
        source: S,
        buffer: BufferConfig,
        cancel: Option<CancellationToken>,
    ) -> PromptStream
    where
        S: ChunkSource + 'static,
    {
        Self::from_lines::<S, ChatResponse>(source, buffer, cancel)
    }

    /// Like [`from_chunks`](Self::from_chunks), decoding each line as `L`.
    pub fn from_lines<S, L>(
        source: S,
        buffer: BufferConfig,
        cancel: Option<CancellationToken>,
    ) -> PromptStream
    where
        S: ChunkSource + 'static,
        L: ResponseLine + Send + 'static,
    {
        let state = StateCell::new();
        let guard = SettleOnDrop(state.clone());
        let token = cancel.unwrap_or_default();

        let inner = async_stream::stream! {
            let guard = guard;
            let cell = &guard.0;
            let mut decoder = NdjsonDecoder::<S, L>::with_config(source, buffer);
            loop {
                let next = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    next = decoder.next_record() => Some(next),
                };
                let Some(next) = next else {
                    tracing::debug!("byte stream cancelled");
                    decoder.release();
                    cell.advance(RequestState::Cancelled);
                    break;
                };
                let next = next.map(|line| line.and_then(ResponseLine::into_record));
                match next {
                    Some(Ok(record)) if record.done => {
                        decoder.release();
                        cell.advance(RequestState::Completed);
                        yield Ok(record);
                        break;
                    }
                    Some(Ok(record)) => {
                        cell.advance(RequestState::Active);
                        yield Ok(record);
                    }
                    Some(Err(e)) => {
                        decoder.release();
                        cell.advance(RequestState::Errored);
                        yield Err(e);
                        break;
                    }
                    None => {
                        cell.advance(RequestState::Errored);
                        yield Err(StreamError::Transport(
                            "stream ended before a done record".into(),
                        ));
                        break;
                    }
                }
            }
        };

        PromptStream {
            id: None,
            state,
            inner: Box::pin(inner),
        }
    }
}

/// Marks a byte-path stream cancelled if it is dropped unsettled.
struct SettleOnDrop(StateCell);

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        self.0.advance(RequestState::Cancelled);
    }
}

impl Stream for PromptStream {
    type Item = Result<ChatResponse, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for PromptStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStream")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

/// Settles one push-transport request: moves its state and touches the
/// registry only on the first terminal transition.
#[derive(Clone)]
struct Tracker {
    id: RequestId,
    registry: Arc<RequestRegistry>,
    state: StateCell,
    // Fired on any terminal transition; ends the stream and the token watcher.
    settled: CancellationToken,
}

impl Tracker {
    fn activate(&self) {
        self.state.advance(RequestState::Active);
    }

    fn complete(&self) {
        if self.state.advance(RequestState::Completed) {
            self.registry.complete(self.id);
            self.settled.cancel();
        }
    }

    fn fail(&self) {
        if self.state.advance(RequestState::Errored) {
            self.registry.complete(self.id);
            self.settled.cancel();
        }
    }

    /// Run the registered cancel action, which settles the request locally
    /// before asking the transport to stop.
    fn cancel(&self) {
        match self.registry.cancel_one(self.id) {
            Ok(_) => {}
            Err(e) if e.is_fatal() => {
                tracing::warn!(request_id = %self.id, error = %e, "remote stop failed");
            }
            Err(e) => {
                tracing::debug!(request_id = %self.id, error = %e, "remote stop ignored");
            }
        }
    }
}

/// The registry action for one request: mark it cancelled, wake its
/// stream, then stop it remotely. A no-op once the request settled.
fn cancel_action<T>(
    id: RequestId,
    state: StateCell,
    settled: CancellationToken,
    transport: Arc<T>,
) -> impl FnOnce() -> Result<(), StreamError> + Send + 'static
where
    T: PromptTransport + ?Sized + 'static,
{
    move || {
        if !state.advance(RequestState::Cancelled) {
            return Ok(());
        }
        settled.cancel();
        transport.stop(id)
    }
}

/// Cancels the request if the stream is dropped before it settled.
struct AbandonGuard(Tracker);

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if !self.0.state.get().is_terminal() {
            tracing::debug!(request_id = %self.0.id, "stream abandoned");
        }
        self.0.cancel();
    }
}

/// Turns a [`PromptTransport`] (or a raw [`ChunkSource`]) into
/// [`PromptStream`]s, tracking push-transport requests in a
/// [`RequestRegistry`].
pub struct StreamAdapter<T: ?Sized> {
    transport: Arc<T>,
    registry: Arc<RequestRegistry>,
    buffer: BufferConfig,
}

impl<T: ?Sized> StreamAdapter<T> {
    /// Buffer sizes used by [`from_chunks`](Self::from_chunks).
    #[must_use]
    pub fn with_buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// Stream records decoded from a newline-delimited JSON byte source,
    /// with this adapter's buffer sizes. See [`PromptStream::from_chunks`].
    pub fn from_chunks<S>(&self, source: S, cancel: Option<CancellationToken>) -> PromptStream
    where
        S: ChunkSource + 'static,
    {
        PromptStream::from_chunks(source, self.buffer, cancel)
    }
}

impl<T: PromptTransport + ?Sized + 'static> StreamAdapter<T> {
    /// Adapt `transport`, registering requests in `registry`.
    pub fn new(transport: Arc<T>, registry: Arc<RequestRegistry>) -> Self {
        Self {
            transport,
            registry,
            buffer: BufferConfig::default(),
        }
    }

    /// The registry requests are tracked in.
    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Submit `request` and stream its records.
    ///
    /// The request is registered before any event is read. Firing `cancel`
    /// stops the request even while nobody polls the stream.
    pub async fn prompt(
        &self,
        request: PromptRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<PromptStream, StreamError> {
        let model = request.model.clone();
        let submission = self.transport.submit(request).await?;
        let id = submission.id;
        let mut events = submission.events;

        let state = StateCell::new();
        let settled = CancellationToken::new();
        self.registry.register(
            id,
            cancel_action(id, state.clone(), settled.clone(), Arc::clone(&self.transport)),
        );
        tracing::debug!(request_id = %id, model = %model, "prompt submitted");

        let tracker = Tracker {
            id,
            registry: Arc::clone(&self.registry),
            state: state.clone(),
            settled,
        };
        let token = cancel.unwrap_or_default();

        let watcher = tracker.clone();
        let watched = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = watcher.settled.cancelled() => {}
                _ = watched.cancelled() => {
                    tracing::debug!(request_id = %watcher.id, "cancellation token fired");
                    watcher.cancel();
                }
            }
        });

        let guard = AbandonGuard(tracker);
        let inner = async_stream::stream! {
            let guard = guard;
            let tracker = &guard.0;
            loop {
                let event = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    _ = tracker.settled.cancelled() => None,
                    event = events.recv() => Some(event),
                };
                let Some(event) = event else {
                    tracker.cancel();
                    break;
                };
                match event {
                    Some(PromptEvent::Message(record)) => {
                        if record.done {
                            tracker.complete();
                            yield Ok(record);
                            break;
                        }
                        tracker.activate();
                        yield Ok(record);
                    }
                    Some(PromptEvent::Stopped) => {
                        tracker.complete();
                        break;
                    }
                    Some(PromptEvent::Failed(message)) => {
                        tracker.fail();
                        yield Err(StreamError::Transport(message));
                        break;
                    }
                    Some(other) => {
                        tracing::trace!(request_id = %tracker.id, event = ?other, "ignoring event");
                    }
                    None => {
                        tracker.fail();
                        yield Err(StreamError::Transport(
                            "event channel closed before completion".into(),
                        ));
                        break;
                    }
                }
            }
        };

        Ok(PromptStream {
            id: Some(id),
            state,
            inner: Box::pin(inner),
        })
    }
}
