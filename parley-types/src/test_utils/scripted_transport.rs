//! ScriptedTransport — a push transport driven by the test.

use super::lock;
use crate::error::StreamError;
use crate::id::RequestId;
use crate::message::PromptRequest;
use crate::transport::{PromptEvent, PromptTransport, Submission};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// A [`PromptTransport`] that queues a fixed script of events on every
/// submission and records each `stop`, `load`, and `unload` call.
///
/// `stop` acknowledges with a final [`PromptEvent::Stopped`] and closes
/// the channel, like a host whose worker noticed the cancellation. With
/// [`without_stop_ack`](ScriptedTransport::without_stop_ack) it only
/// records the call and the channel stays open.
///
/// The event channel stays open after the script, so a sequence without a
/// `done` record waits for [`push`](ScriptedTransport::push) or
/// [`close`](ScriptedTransport::close).
pub struct ScriptedTransport {
    next_id: AtomicU64,
    script: Vec<PromptEvent>,
    senders: Mutex<HashMap<RequestId, mpsc::Sender<PromptEvent>>>,
    submitted: Mutex<Vec<(RequestId, PromptRequest)>>,
    stops: Mutex<Vec<RequestId>>,
    loads: Mutex<Vec<String>>,
    unloads: Mutex<Vec<String>>,
    refuse_submit: Option<String>,
    ack_stop: bool,
}

impl ScriptedTransport {
    /// A transport that sends no events until the test pushes some.
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// A transport that queues `script` for every submitted prompt.
    pub fn with_script(script: Vec<PromptEvent>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            script,
            senders: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            stops: Mutex::new(Vec::new()),
            loads: Mutex::new(Vec::new()),
            unloads: Mutex::new(Vec::new()),
            refuse_submit: None,
            ack_stop: true,
        }
    }

    /// Make every submission fail with a transport error.
    pub fn refusing(mut self, message: impl Into<String>) -> Self {
        self.refuse_submit = Some(message.into());
        self
    }

    /// Record `stop` calls without acknowledging them.
    pub fn without_stop_ack(mut self) -> Self {
        self.ack_stop = false;
        self
    }

    /// Push one more event for `id`. Returns `false` when nobody is listening.
    pub async fn push(&self, id: RequestId, event: PromptEvent) -> bool {
        let sender = lock(&self.senders).get(&id).cloned();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Drop the sending side for `id`, closing its channel.
    pub fn close(&self, id: RequestId) {
        lock(&self.senders).remove(&id);
    }

    /// Every `stop` call received, in order.
    pub fn stops(&self) -> Vec<RequestId> {
        lock(&self.stops).clone()
    }

    /// Every submitted request with the id it was given.
    pub fn submitted(&self) -> Vec<(RequestId, PromptRequest)> {
        lock(&self.submitted).clone()
    }

    /// Models passed to `load`.
    pub fn loads(&self) -> Vec<String> {
        lock(&self.loads).clone()
    }

    /// Models passed to `unload`.
    pub fn unloads(&self) -> Vec<String> {
        lock(&self.unloads).clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptTransport for ScriptedTransport {
    async fn submit(&self, request: PromptRequest) -> Result<Submission, StreamError> {
        if let Some(message) = &self.refuse_submit {
            return Err(StreamError::Transport(message.clone()));
        }
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(self.script.len() + 16);
        for event in &self.script {
            // Capacity covers the whole script.
            let _ = tx.try_send(event.clone());
        }
        lock(&self.senders).insert(id, tx);
        lock(&self.submitted).push((id, request));
        Ok(Submission { id, events: rx })
    }

    fn stop(&self, id: RequestId) -> Result<(), StreamError> {
        lock(&self.stops).push(id);
        if !self.ack_stop {
            return Ok(());
        }
        if let Some(tx) = lock(&self.senders).remove(&id) {
            let _ = tx.try_send(PromptEvent::Stopped);
        }
        Ok(())
    }

    async fn load(&self, model: &str) -> Result<(), StreamError> {
        lock(&self.loads).push(model.to_owned());
        Ok(())
    }

    async fn unload(&self, model: &str) -> Result<(), StreamError> {
        lock(&self.unloads).push(model.to_owned());
        Ok(())
    }
}
