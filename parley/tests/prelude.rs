//! The prelude is enough to prompt a model end to end.

use futures::StreamExt;
use parley::prelude::*;
use parley::types::test_utils::ScriptedTransport;
use std::sync::Arc;

fn record(content: &str, done: bool) -> PromptEvent {
    PromptEvent::Message(ChatResponse {
        done,
        message: ChatMessage::assistant(content),
    })
}

#[tokio::test]
async fn prompt_through_prelude() {
    let transport = Arc::new(ScriptedTransport::with_script(vec![
        record("Hi", false),
        record(" there", true),
    ]));
    let model = ModelHandle::new("llama3.2", transport);

    let mut stream = model
        .prompt(ChatMessage::user("Hello"), Vec::new(), PromptOptions::default())
        .await
        .unwrap();
    let mut text = String::new();
    while let Some(record) = stream.next().await {
        text.push_str(&record.unwrap().message.content);
    }

    assert_eq!(text, "Hi there");
    assert_eq!(stream.state(), RequestState::Completed);
}
