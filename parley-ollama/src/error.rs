//! Ollama errors and their mapping from HTTP.

use crate::types::ErrorBody;
use parley_types::StreamError;
use thiserror::Error;

/// Errors talking to an Ollama server.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OllamaError {
    /// The model is not installed (HTTP 404).
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The server rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The server failed (HTTP 5xx).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The request did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// Connecting or talking to the server failed.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

impl From<OllamaError> for StreamError {
    fn from(err: OllamaError) -> Self {
        StreamError::Transport(err.to_string())
    }
}

/// Map an HTTP status and body to an [`OllamaError`].
///
/// Ollama reports failures as `{"error": "..."}`; other bodies are kept as is.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> OllamaError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.to_owned(),
    };
    match status.as_u16() {
        404 => OllamaError::ModelNotFound(message),
        400 => OllamaError::InvalidRequest(message),
        500..=599 => OllamaError::ServiceUnavailable(message),
        _ => OllamaError::InvalidRequest(format!("HTTP {status}: {message}")),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> OllamaError {
    if err.is_timeout() {
        OllamaError::Timeout
    } else {
        OllamaError::Network(err)
    }
}

/// Pass a successful response through, turn any other into an error.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, OllamaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, body = %body, "ollama request failed");
    Err(map_http_status(status, &body))
}
