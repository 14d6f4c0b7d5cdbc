//! ChunkedSource — replays fixed chunks and counts releases.

use crate::error::StreamError;
use crate::transport::ChunkSource;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`ChunkSource`] that hands out pre-recorded chunks.
///
/// Every call to `release` is counted, including redundant ones, so tests
/// can assert the reader released exactly once.
pub struct ChunkedSource {
    chunks: VecDeque<Bytes>,
    failure: Option<String>,
    released: bool,
    releases: Arc<AtomicUsize>,
    pulls: Arc<AtomicUsize>,
}

impl ChunkedSource {
    /// Replay `chunks` in order, then signal end of stream.
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
            released: false,
            releases: Arc::new(AtomicUsize::new(0)),
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Split `data` into chunks of at most `size` bytes.
    pub fn split(data: &[u8], size: usize) -> Self {
        let size = size.max(1);
        Self::new(data.chunks(size).map(Bytes::copy_from_slice).collect::<Vec<_>>())
    }

    /// Fail with a transport error once the chunks run out, instead of ending.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Shared counter of `release` calls.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    /// Shared counter of `next_chunk` calls.
    pub fn pull_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulls)
    }
}

#[async_trait]
impl ChunkSource for ChunkedSource {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, StreamError>> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.released {
            return None;
        }
        match self.chunks.pop_front() {
            Some(chunk) => Some(Ok(chunk)),
            None => self.failure.take().map(|m| Err(StreamError::Transport(m))),
        }
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.released = true;
        self.chunks.clear();
    }
}
