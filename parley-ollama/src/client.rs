//! HTTP client for one Ollama server.

use crate::error::{OllamaError, check_status, map_reqwest_error};
use crate::types::{ChatLine, ChatRequest, GenerateRequest};
use parley_ndjson::{BufferConfig, StreamSource};
use parley_stream::PromptStream;
use parley_types::PromptRequest;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default Ollama API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// How long a prompted model stays loaded unless configured otherwise.
const DEFAULT_KEEP_ALIVE: &str = "10m";

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the Ollama HTTP API.
///
/// ```no_run
/// use parley_ollama::OllamaClient;
///
/// let client = OllamaClient::new()
///     .with_url("http://gpu-box:11434")
///     .with_keep_alive("30m");
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    keep_alive: Option<String>,
    buffer: BufferConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    /// A client for `http://localhost:11434` that keeps prompted models
    /// loaded for ten minutes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            keep_alive: Some(DEFAULT_KEEP_ALIVE.into()),
            buffer: BufferConfig::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL, e.g. for a remote server or a mock.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// How long the server keeps a model loaded after a prompt.
    ///
    /// Examples: `"5m"`, `"0"` (unload right away), `"-1"` (forever).
    #[must_use]
    pub fn with_keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }

    /// Buffer sizes for decoding streamed responses.
    #[must_use]
    pub fn with_buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// The API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{name}", self.base_url.trim_end_matches('/'))
    }

    /// Start a streamed chat completion.
    ///
    /// Fails before streaming when the server rejects the request. Once
    /// streaming, failures arrive as the stream's error item.
    pub async fn chat_stream(
        &self,
        request: &PromptRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<PromptStream, OllamaError> {
        let body = ChatRequest {
            model: &request.model,
            messages: request.messages(),
            stream: true,
            think: request.think,
            keep_alive: self.keep_alive.as_deref(),
        };
        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        tracing::debug!(
            model = %request.model,
            messages = body.messages.len(),
            "chat stream opened"
        );

        let source = StreamSource::new(response.bytes_stream());
        Ok(PromptStream::from_lines::<_, ChatLine>(
            source,
            self.buffer,
            cancel,
        ))
    }

    /// Load `model` into memory ahead of the first prompt.
    pub async fn load(&self, model: &str) -> Result<(), OllamaError> {
        self.generate(model, None).await?;
        tracing::info!(model, "model loaded");
        Ok(())
    }

    /// Unload `model` from memory.
    pub async fn unload(&self, model: &str) -> Result<(), OllamaError> {
        self.generate(model, Some(0)).await?;
        tracing::info!(model, "model unloaded");
        Ok(())
    }

    async fn generate(&self, model: &str, keep_alive: Option<u32>) -> Result<(), OllamaError> {
        let body = GenerateRequest { model, keep_alive };
        let response = self
            .client
            .post(self.endpoint("generate"))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// Whether the server answers within two seconds.
    pub async fn is_running(&self) -> bool {
        let probe = self
            .client
            .head(self.endpoint("version"))
            .header("Cache", "no-store")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match probe {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "ollama probe failed");
                false
            }
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}
