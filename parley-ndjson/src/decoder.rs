//! Pull-based NDJSON record decoder.

use crate::buffer::{BufferConfig, GrowableBuffer};
use futures::Stream;
use parley_types::{ChunkSource, StreamError};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// NDJSON is always delimited by U+000A.
const DELIMITER: u8 = b'\n';

/// Decodes one `T` per newline-terminated line of a [`ChunkSource`].
///
/// A chunk may carry several records, part of one, or end exactly on a
/// delimiter; the buffer carries partial lines across chunks. Trailing
/// bytes without a final newline are decoded as one last record at end of
/// stream. Empty and whitespace-only lines are malformed.
///
/// The source is released exactly once: when the stream ends, when a
/// record fails to decode, when [`release`](Self::release) is called, or
/// when the decoder is dropped early.
pub struct NdjsonDecoder<S: ChunkSource, T> {
    source: S,
    buffer: GrowableBuffer,
    // Bytes of `buffer` already known to hold no delimiter.
    scanned: usize,
    end_of_stream: bool,
    finished: bool,
    released: bool,
    _record: PhantomData<fn() -> T>,
}

impl<S: ChunkSource, T: DeserializeOwned> NdjsonDecoder<S, T> {
    /// Decode `source` with the default buffer sizes.
    pub fn new(source: S) -> Self {
        Self::with_config(source, BufferConfig::default())
    }

    /// Decode `source` with explicit buffer sizes.
    pub fn with_config(source: S, config: BufferConfig) -> Self {
        Self {
            source,
            buffer: GrowableBuffer::new(config),
            scanned: 0,
            end_of_stream: false,
            finished: false,
            released: false,
            _record: PhantomData,
        }
    }

    /// The next record, a terminal error, or `None` once the sequence ended.
    ///
    /// After an error every further call returns `None`.
    pub async fn next_record(&mut self) -> Option<Result<T, StreamError>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(idx) = self.find_delimiter() {
                let record = self.take_line(idx);
                if record.is_err() {
                    self.release();
                }
                return Some(record);
            }

            if self.end_of_stream {
                self.release();
                if self.buffer.is_empty() {
                    return None;
                }
                let record = decode(self.buffer.view());
                self.buffer.clear();
                return Some(record);
            }

            match self.source.next_chunk().await {
                Some(Ok(chunk)) => {
                    tracing::trace!(
                        bytes = chunk.len(),
                        buffered = self.buffer.len(),
                        "ndjson chunk"
                    );
                    if let Err(e) = self.buffer.append(&chunk) {
                        self.release();
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "ndjson source failed");
                    self.release();
                    return Some(Err(e));
                }
                None => self.end_of_stream = true,
            }
        }
    }

    /// Stop decoding and release the source. Idempotent.
    pub fn release(&mut self) {
        self.finished = true;
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }

    /// Whether the sequence has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Turn the decoder into a [`Stream`] of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, StreamError>> + Send
    where
        S: 'static,
        T: Send + 'static,
    {
        futures::stream::unfold(self, |mut decoder| async move {
            decoder.next_record().await.map(|record| (record, decoder))
        })
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        let view = self.buffer.view();
        match view[self.scanned..].iter().position(|&b| b == DELIMITER) {
            Some(offset) => Some(self.scanned + offset),
            None => {
                self.scanned = view.len();
                None
            }
        }
    }

    fn take_line(&mut self, idx: usize) -> Result<T, StreamError> {
        let record = self.buffer.view_range(..idx).and_then(decode);
        self.buffer.remove_prefix(idx + 1)?;
        self.scanned = 0;
        record
    }
}

impl<S: ChunkSource, T> Drop for NdjsonDecoder<S, T> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

fn decode<T: DeserializeOwned>(line: &[u8]) -> Result<T, StreamError> {
    serde_json::from_slice(line).map_err(|e| {
        tracing::debug!(error = %e, len = line.len(), "malformed ndjson record");
        StreamError::MalformedRecord(e.to_string())
    })
}
