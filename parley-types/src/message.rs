//! Chat messages and the response records streamed back for them.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// The human side.
    User,
    /// The model side.
    Assistant,
    /// Output of a tool invocation.
    Tool,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,

    /// Text content. Streamed records carry only the newly generated slice.
    #[serde(default)]
    pub content: String,

    /// Base64-encoded images attached to the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    /// Reasoning text, when the model was asked to think.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl ChatMessage {
    /// Create a message with the given role and text.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: None,
            thinking: None,
        }
    }

    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach base64-encoded images.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }
}

/// One record of a streamed response.
///
/// In a well-formed sequence exactly one record has `done = true` and it is
/// the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Whether this is the final record.
    pub done: bool,

    /// The generated slice of the assistant message.
    pub message: ChatMessage,
}

/// A prompt submitted to a model.
///
/// The backend sees `history` followed by `content` as the message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Model name as the backend knows it.
    pub model: String,

    /// The new message.
    pub content: ChatMessage,

    /// Earlier messages, oldest first.
    #[serde(default)]
    pub history: Vec<ChatMessage>,

    /// Ask the model to emit reasoning into `thinking`.
    #[serde(default)]
    pub think: bool,
}

impl PromptRequest {
    /// Create a request with no history and thinking disabled.
    pub fn new(model: impl Into<String>, content: ChatMessage) -> Self {
        Self {
            model: model.into(),
            content,
            history: Vec::new(),
            think: false,
        }
    }

    /// Set the earlier conversation.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Toggle thinking output.
    pub fn with_think(mut self, think: bool) -> Self {
        self.think = think;
        self
    }

    /// The full message list in wire order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(self.content.clone());
        messages
    }
}
