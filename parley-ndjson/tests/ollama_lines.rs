//! Decoding realistic backend output: extra fields, thinking text,
//! carriage returns, multi-byte characters split across chunks.

use parley_ndjson::{BufferConfig, NdjsonDecoder};
use parley_types::test_utils::ChunkedSource;
use parley_types::{ChatResponse, Role, StreamError};

const BODY: &str = concat!(
    r#"{"model":"llama3.2","created_at":"2025-01-01T00:00:00Z","message":{"role":"assistant","content":"","thinking":"Let me think"},"done":false}"#,
    "\n",
    r#"{"model":"llama3.2","created_at":"2025-01-01T00:00:01Z","message":{"role":"assistant","content":"Grüße"},"done":false}"#,
    "\r\n",
    r#"{"model":"llama3.2","created_at":"2025-01-01T00:00:02Z","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","eval_count":10,"prompt_eval_count":20}"#,
    "\n",
);

async fn decode_all(source: ChunkedSource) -> Vec<Result<ChatResponse, StreamError>> {
    let mut decoder = NdjsonDecoder::new(source);
    let mut out = Vec::new();
    while let Some(record) = decoder.next_record().await {
        out.push(record);
    }
    out
}

#[tokio::test]
async fn backend_lines_decode_in_order() {
    let records = decode_all(ChunkedSource::new(vec![BODY])).await;
    let records: Vec<ChatResponse> = records.into_iter().map(Result::unwrap).collect();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].message.thinking.as_deref(), Some("Let me think"));
    assert_eq!(records[1].message.content, "Grüße");
    assert_eq!(records[2].message.role, Role::Assistant);
    assert!(records.iter().take(2).all(|r| !r.done));
    assert!(records[2].done);
}

#[tokio::test]
async fn multibyte_characters_survive_any_split() {
    let whole: Vec<_> = decode_all(ChunkedSource::new(vec![BODY]))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    for size in [1, 2, 3, 5, 13, 64] {
        let parted: Vec<_> = decode_all(ChunkedSource::split(BODY.as_bytes(), size))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(parted, whole, "chunk size {size}");
    }
}

#[tokio::test]
async fn small_buffer_grows_for_long_lines() {
    let source = ChunkedSource::split(BODY.as_bytes(), 16);
    let mut decoder =
        NdjsonDecoder::<_, ChatResponse>::with_config(source, BufferConfig::new(8, 1024));
    let mut count = 0;
    while let Some(record) = decoder.next_record().await {
        record.unwrap();
        count += 1;
    }
    assert_eq!(count, 3);
}
