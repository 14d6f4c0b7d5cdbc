#![deny(missing_docs)]
//! # parley — umbrella crate
//!
//! A single import surface for parley: the protocol types, the NDJSON
//! decoder, cancellable prompt streams, and (behind `ollama`) the Ollama
//! backend. The [`prelude`] covers the happy path.

#[cfg(feature = "core")]
pub use parley_ndjson as ndjson;
#[cfg(feature = "ollama")]
pub use parley_ollama as ollama;
#[cfg(feature = "core")]
pub use parley_stream as stream;
#[cfg(feature = "core")]
pub use parley_types as types;

/// Happy-path imports for prompting a model and consuming its answer.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use parley_types::{
        ChatMessage, ChatResponse, ChunkSource, PromptEvent, PromptRequest, PromptTransport,
        RequestId, Role, StreamError, Submission,
    };

    #[cfg(feature = "core")]
    pub use parley_ndjson::{BufferConfig, NdjsonDecoder, StreamSource};

    #[cfg(feature = "core")]
    pub use parley_stream::{
        CancelReport, CancellationToken, ModelHandle, PromptOptions, PromptStream, RequestRegistry,
        RequestState, StreamAdapter, generate_title, prepend_assistant_context,
    };

    #[cfg(feature = "ollama")]
    pub use parley_ollama::{OllamaClient, OllamaError, OllamaHost};
}
