//! Acceptance tests for the protocol crate.
//!
//! Tests cover:
//! - Trait object safety (Box/Arc<dyn Trait> are Send (+ Sync))
//! - Wire shape of the response records
//! - Request id conversions

use parley_types::*;
use serde_json::json;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Object Safety
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn _assert_send<T: Send>() {}
fn _assert_send_sync<T: Send + Sync>() {}

#[test]
fn boxed_chunk_source_is_send() {
    _assert_send::<Box<dyn ChunkSource>>();
}

#[test]
fn arc_prompt_transport_is_send_sync() {
    _assert_send_sync::<std::sync::Arc<dyn PromptTransport>>();
}

#[test]
fn stream_error_is_send_sync() {
    _assert_send_sync::<StreamError>();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn scenario_lines_parse() {
    let first: ChatResponse = serde_json::from_str(
        r#"{"done":false,"message":{"role":"assistant","content":"Hi"}}"#,
    )
    .unwrap();
    let last: ChatResponse = serde_json::from_str(
        r#"{"done":true,"message":{"role":"assistant","content":""}}"#,
    )
    .unwrap();

    assert!(!first.done);
    assert_eq!(first.message.role, Role::Assistant);
    assert_eq!(first.message.content, "Hi");
    assert!(last.done);
    assert!(last.message.content.is_empty());
}

#[test]
fn images_serialize_as_base64_list() {
    let msg = ChatMessage::user("look").with_images(vec!["aGVsbG8=".into()]);
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({"role": "user", "content": "look", "images": ["aGVsbG8="]})
    );
}

#[test]
fn missing_done_is_rejected() {
    let err = serde_json::from_str::<ChatResponse>(
        r#"{"message":{"role":"assistant","content":"x"}}"#,
    );
    assert!(err.is_err());
}

#[test]
fn prompt_request_defaults() {
    let req: PromptRequest = serde_json::from_value(json!({
        "model": "llama3.2",
        "content": {"role": "user", "content": "hi"}
    }))
    .unwrap();
    assert!(req.history.is_empty());
    assert!(!req.think);
    assert_eq!(req.messages().len(), 1);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request ids
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn request_id_conversions() {
    let id: RequestId = 42.into();
    assert_eq!(id, RequestId::new(42));
    assert_eq!(id.get(), 42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(serde_json::to_value(id).unwrap(), json!(42));
}
