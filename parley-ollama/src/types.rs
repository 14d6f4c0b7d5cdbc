//! Ollama wire types.
//!
//! - Chat is POST `/api/chat`; with `stream: true` the body is NDJSON, one
//!   [`ChatResponse`] per line, the last with `done: true`.
//! - A failure after the stream started arrives as a line `{"error": "..."}`.
//! - POST `/api/generate` without a prompt loads a model; with
//!   `keep_alive: 0` it unloads it.

use parley_stream::ResponseLine;
use parley_types::{ChatMessage, ChatResponse, StreamError};
use serde::{Deserialize, Serialize};

/// `/api/chat` request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub think: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<&'a str>,
}

/// `/api/generate` request body used to load or unload a model.
///
/// `keep_alive` is always sent; `null` means the server default.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub keep_alive: Option<u32>,
}

/// One line of a streamed chat body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChatLine {
    Failure { error: String },
    Chunk(ChatResponse),
}

impl ResponseLine for ChatLine {
    fn into_record(self) -> Result<ChatResponse, StreamError> {
        match self {
            ChatLine::Failure { error } => Err(StreamError::Transport(error)),
            ChatLine::Chunk(record) => Ok(record),
        }
    }
}

/// Error body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
