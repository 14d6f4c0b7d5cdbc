#![cfg(feature = "ollama")]
//! Smoke tests against a local Ollama instance.
//!
//! These tests are `#[ignore]` by default. Run them with:
//!
//!     cargo test -p parley --features ollama --test smoke_ollama -- --ignored
//!
//! They require a running Ollama server with the `llama3.2` model pulled.

use futures::StreamExt;
use parley::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn model() -> ModelHandle<OllamaHost> {
    let client = OllamaClient::new().with_keep_alive("0");
    ModelHandle::new("llama3.2", Arc::new(OllamaHost::new(client)))
}

#[tokio::test]
#[ignore = "requires a local Ollama server"]
async fn streams_a_short_answer() {
    let model = model();
    let stream = model
        .prompt(
            ChatMessage::user("Reply with the single word: pong"),
            Vec::new(),
            PromptOptions::default(),
        )
        .await
        .unwrap();
    let text = stream.collect_text().await.unwrap();
    assert!(!text.trim().is_empty());
    assert!(model.in_flight().is_empty());
}

#[tokio::test]
#[ignore = "requires a local Ollama server"]
async fn cancels_a_long_answer() {
    let model = model();
    let token = CancellationToken::new();
    let mut stream = model
        .prompt(
            ChatMessage::user("Count from 1 to 500, one number per line."),
            Vec::new(),
            PromptOptions::default().with_cancel(token.clone()),
        )
        .await
        .unwrap();

    assert!(stream.next().await.unwrap().is_ok());
    token.cancel();
    let rest = tokio::time::timeout(Duration::from_secs(10), async {
        while stream.next().await.is_some() {}
    })
    .await;

    assert!(rest.is_ok());
    assert_eq!(stream.state(), RequestState::Cancelled);
    assert!(model.in_flight().is_empty());
}

