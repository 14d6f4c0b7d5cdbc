//! Short chat titles, generated by the model itself.

use crate::model::{ModelHandle, PromptOptions};
use parley_types::{ChatMessage, PromptTransport, StreamError};

const TITLE_INSTRUCTION: &str = "You generate a brief title for the given user prompt and chat history.
The title should not be longer than five words and not empty.
The title must not contain any Markdown or HTML.
The title must only contain plain text!
You must only output the title and nothing more!";

/// Ask `model` for a title summarising `history`.
///
/// `history` needs at least two entries (a prompt and its answer).
pub async fn generate_title<T>(
    model: &ModelHandle<T>,
    history: &[ChatMessage],
) -> Result<String, StreamError>
where
    T: PromptTransport + ?Sized + 'static,
{
    if history.len() < 2 {
        return Err(StreamError::InvalidInput(format!(
            "title needs at least two history entries, got {}",
            history.len()
        )));
    }

    // The instruction leads the conversation and is repeated as the
    // final turn.
    let instruction = ChatMessage::system(TITLE_INSTRUCTION);
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(instruction.clone());
    messages.extend_from_slice(history);

    let stream = model
        .prompt(instruction, messages, PromptOptions::default())
        .await?;
    let title = stream.collect_text().await?;
    Ok(title.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::test_utils::ScriptedTransport;
    use parley_types::{ChatResponse, PromptEvent, Role};
    use std::sync::Arc;

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("How do I reverse a Vec?"),
            ChatMessage::assistant("Call `reverse()` on it."),
        ]
    }

    fn chunk(content: &str, done: bool) -> PromptEvent {
        PromptEvent::Message(ChatResponse {
            done,
            message: ChatMessage::assistant(content),
        })
    }

    #[tokio::test]
    async fn rejects_short_history() {
        let transport = Arc::new(ScriptedTransport::new());
        let model = ModelHandle::new("llama3.2", Arc::clone(&transport));

        let err = generate_title(&model, &history()[..1]).await.unwrap_err();

        assert!(matches!(err, StreamError::InvalidInput(_)));
        assert!(transport.submitted().is_empty());
    }

    #[tokio::test]
    async fn concatenates_and_trims_streamed_title() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            chunk(" Reversing", false),
            chunk(" a Vec\n", false),
            chunk("", true),
        ]));
        let model = ModelHandle::new("llama3.2", Arc::clone(&transport));

        let title = generate_title(&model, &history()).await.unwrap();

        assert_eq!(title, "Reversing a Vec");
        let messages = transport.submitted()[0].1.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "How do I reverse a Vec?");
        assert_eq!(messages[3], messages[0]);
        assert!(model.in_flight().is_empty());
    }

    #[tokio::test]
    async fn stream_error_discards_partial_title() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            chunk("Rev", false),
            PromptEvent::Failed("boom".into()),
        ]));
        let model = ModelHandle::new("llama3.2", transport);

        assert!(generate_title(&model, &history()).await.is_err());
    }
}
