//! A named model instance with its own set of in-flight prompts.

use crate::adapter::{PromptStream, StreamAdapter};
use crate::registry::{CancelReport, RequestRegistry};
use parley_types::{ChatMessage, PromptRequest, PromptTransport, RequestId, StreamError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-prompt options.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Ask the model to emit reasoning alongside the answer.
    pub think: bool,
    /// Fires to cancel the prompt.
    pub cancel: Option<CancellationToken>,
}

impl PromptOptions {
    /// Toggle thinking output.
    #[must_use]
    pub fn with_think(mut self, think: bool) -> Self {
        self.think = think;
        self
    }

    /// Cancel the prompt when `token` fires.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// One model, reachable through a shared transport.
///
/// Every handle owns its registry, so [`unload`](Self::unload) cancels only
/// this model's prompts even when several handles share a transport.
pub struct ModelHandle<T: ?Sized> {
    name: String,
    adapter: StreamAdapter<T>,
}

impl<T: PromptTransport + ?Sized + 'static> ModelHandle<T> {
    /// A handle for `name` on `transport`.
    pub fn new(name: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            name: name.into(),
            adapter: StreamAdapter::new(transport, Arc::new(RequestRegistry::new())),
        }
    }

    /// The model name as the backend knows it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prompt the model with `content` after `history`.
    ///
    /// May be called again before earlier streams finished; each stream is
    /// tracked on its own.
    pub async fn prompt(
        &self,
        content: ChatMessage,
        history: Vec<ChatMessage>,
        options: PromptOptions,
    ) -> Result<PromptStream, StreamError> {
        let request = PromptRequest::new(self.name.clone(), content)
            .with_history(history)
            .with_think(options.think);
        self.adapter.prompt(request, options.cancel).await
    }

    /// Cancel every outstanding prompt of this model.
    pub fn stop_all_prompts(&self) -> CancelReport {
        let report = self.adapter.registry().cancel_all();
        if report.attempted > 0 {
            tracing::info!(
                model = %self.name,
                cancelled = report.attempted,
                failed = report.failures.len(),
                "stopped all prompts"
            );
        }
        report
    }

    /// Ask the backend to load the model ahead of the first prompt.
    pub async fn load(&self) -> Result<(), StreamError> {
        self.adapter.transport().load(&self.name).await
    }

    /// Cancel every outstanding prompt, then unload the model.
    ///
    /// Cancellation failures do not prevent the unload; they are returned
    /// in the report.
    pub async fn unload(&self) -> Result<CancelReport, StreamError> {
        let report = self.stop_all_prompts();
        self.adapter.transport().unload(&self.name).await?;
        tracing::info!(model = %self.name, "model unloaded");
        Ok(report)
    }

    /// Ids of prompts still in flight.
    pub fn in_flight(&self) -> Vec<RequestId> {
        self.adapter.registry().ids()
    }
}

impl<T: ?Sized> std::fmt::Debug for ModelHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
