//! Host-side prompt transport: each prompt runs on its own task and pushes
//! events to the consumer through a channel.

use crate::client::OllamaClient;
use async_trait::async_trait;
use futures::StreamExt;
use parley_stream::PromptStream;
use parley_types::{PromptEvent, PromptRequest, PromptTransport, RequestId, StreamError, Submission};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Events buffered per prompt before the pump waits for the consumer.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

type Tasks = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

fn lock(tasks: &Tasks) -> MutexGuard<'_, HashMap<RequestId, CancellationToken>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`PromptTransport`] backed by an [`OllamaClient`].
///
/// `submit` opens the chat stream and hands it to a pump task; `stop`
/// fires that task's token without waiting for it to exit. A stopped task
/// sends [`PromptEvent::Stopped`] as its last event.
pub struct OllamaHost {
    client: OllamaClient,
    next_id: AtomicU64,
    tasks: Tasks,
    event_capacity: usize,
}

impl OllamaHost {
    /// Serve prompts through `client`.
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Events buffered per prompt. Clamped to at least one.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// Number of pump tasks still running.
    pub fn running_tasks(&self) -> usize {
        lock(&self.tasks).len()
    }
}

#[async_trait]
impl PromptTransport for OllamaHost {
    async fn submit(&self, request: PromptRequest) -> Result<Submission, StreamError> {
        let token = CancellationToken::new();
        let stream = self.client.chat_stream(&request, Some(token.clone())).await?;

        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(self.event_capacity);
        lock(&self.tasks).insert(id, token.clone());
        tracing::debug!(request_id = %id, model = %request.model, "prompt task started");

        tokio::spawn(pump(id, stream, token, tx, Arc::clone(&self.tasks)));
        Ok(Submission { id, events: rx })
    }

    fn stop(&self, id: RequestId) -> Result<(), StreamError> {
        match lock(&self.tasks).get(&id) {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(StreamError::UnknownRequest(id)),
        }
    }

    async fn load(&self, model: &str) -> Result<(), StreamError> {
        Ok(self.client.load(model).await?)
    }

    async fn unload(&self, model: &str) -> Result<(), StreamError> {
        Ok(self.client.unload(model).await?)
    }
}

/// Forward `stream` into `tx` until it ends, the receiver goes away, or
/// `token` fires; then forget `id`.
async fn pump(
    id: RequestId,
    mut stream: PromptStream,
    token: CancellationToken,
    tx: mpsc::Sender<PromptEvent>,
    tasks: Tasks,
) {
    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(record) => PromptEvent::Message(record),
            Err(e) => PromptEvent::Failed(e.to_string()),
        };
        let sent = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sent = tx.send(event) => sent,
        };
        if sent.is_err() {
            tracing::debug!(request_id = %id, "receiver dropped");
            break;
        }
    }
    drop(stream);

    if token.is_cancelled() {
        // The consumer may be gone or slow; the stop notice is best effort.
        let _ = tx.try_send(PromptEvent::Stopped);
        tracing::debug!(request_id = %id, "prompt task stopped");
    }
    lock(&tasks).remove(&id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parley_ndjson::{BufferConfig, StreamSource};

    const FIRST: &str = concat!(
        r#"{"done":false,"message":{"role":"assistant","content":"Hel"}}"#,
        "\n"
    );

    /// A stream that sends one record and then hangs, like a model mid-answer.
    fn hanging_stream(token: &CancellationToken) -> PromptStream {
        let first = Ok::<_, String>(Bytes::from_static(FIRST.as_bytes()));
        let chunks = futures::stream::iter(vec![first]).chain(futures::stream::pending());
        PromptStream::from_chunks(
            StreamSource::new(chunks),
            BufferConfig::default(),
            Some(token.clone()),
        )
    }

    #[tokio::test]
    async fn stopped_task_sends_stopped_and_forgets_id() {
        let tasks: Tasks = Arc::new(Mutex::new(HashMap::new()));
        let token = CancellationToken::new();
        let id = RequestId::new(7);
        lock(&tasks).insert(id, token.clone());
        let (tx, mut rx) = mpsc::channel(4);

        let stream = hanging_stream(&token);
        let handle = tokio::spawn(pump(id, stream, token.clone(), tx, Arc::clone(&tasks)));

        assert!(matches!(
            rx.recv().await,
            Some(PromptEvent::Message(r)) if r.message.content == "Hel"
        ));
        token.cancel();
        assert!(matches!(rx.recv().await, Some(PromptEvent::Stopped)));
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
        assert!(lock(&tasks).is_empty());
    }

    #[tokio::test]
    async fn dropped_receiver_ends_task() {
        let tasks: Tasks = Arc::new(Mutex::new(HashMap::new()));
        let token = CancellationToken::new();
        let id = RequestId::new(1);
        lock(&tasks).insert(id, token.clone());
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        pump(id, hanging_stream(&token), token, tx, Arc::clone(&tasks)).await;
        assert!(lock(&tasks).is_empty());
    }

    #[test]
    fn stop_unknown_request() {
        let host = OllamaHost::new(OllamaClient::new());
        let err = host.stop(RequestId::new(42)).unwrap_err();
        assert!(matches!(err, StreamError::UnknownRequest(id) if id.get() == 42));
    }

    #[test]
    fn event_capacity_is_at_least_one() {
        let host = OllamaHost::new(OllamaClient::new()).with_event_capacity(0);
        assert_eq!(host.event_capacity, 1);
        assert_eq!(OllamaHost::new(OllamaClient::new()).event_capacity, DEFAULT_EVENT_CAPACITY);
    }
}
