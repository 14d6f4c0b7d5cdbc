//! Adapts any chunked byte stream (an HTTP body, a file reader) to
//! [`ChunkSource`].

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parley_types::{ChunkSource, StreamError};
use std::fmt::Display;
use std::pin::Pin;

/// A [`ChunkSource`] over a `Stream<Item = Result<Bytes, E>>`.
///
/// Releasing drops the inner stream, which for an HTTP body closes the
/// connection. Stream errors become [`StreamError::Transport`].
pub struct StreamSource<St> {
    inner: Option<Pin<Box<St>>>,
}

impl<St, E> StreamSource<St>
where
    St: Stream<Item = Result<Bytes, E>> + Send,
    E: Display + Send + 'static,
{
    /// Wrap `stream`.
    pub fn new(stream: St) -> Self {
        Self {
            inner: Some(Box::pin(stream)),
        }
    }

    /// Whether the inner stream has been dropped.
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

#[async_trait]
impl<St, E> ChunkSource for StreamSource<St>
where
    St: Stream<Item = Result<Bytes, E>> + Send,
    E: Display + Send + 'static,
{
    async fn next_chunk(&mut self) -> Option<Result<Bytes, StreamError>> {
        let stream = self.inner.as_mut()?;
        stream
            .next()
            .await
            .map(|chunk| chunk.map_err(|e| StreamError::Transport(e.to_string())))
    }

    fn release(&mut self) {
        if self.inner.take().is_some() {
            tracing::trace!("released byte stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::NdjsonDecoder;

    #[tokio::test]
    async fn maps_stream_errors_to_transport() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"{\"a\":1}\n")),
            Err("reset by peer".into()),
        ];
        let mut source = StreamSource::new(futures::stream::iter(chunks));

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "{\"a\":1}\n");
        let err = source.next_chunk().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Transport(m) if m == "reset by peer"));
        assert!(source.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn release_is_idempotent_and_ends_stream() {
        let chunks: Vec<Result<Bytes, String>> = vec![Ok(Bytes::from_static(b"x"))];
        let mut source = StreamSource::new(futures::stream::iter(chunks));
        source.release();
        source.release();
        assert!(source.is_released());
        assert!(source.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn decodes_through_decoder() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"{\"n\":")),
            Ok(Bytes::from_static(b"1}\n{\"n\":2}\n")),
        ];
        let source = StreamSource::new(futures::stream::iter(chunks));
        let mut decoder = NdjsonDecoder::<_, serde_json::Value>::new(source);
        assert_eq!(decoder.next_record().await.unwrap().unwrap()["n"], 1);
        assert_eq!(decoder.next_record().await.unwrap().unwrap()["n"], 2);
        assert!(decoder.next_record().await.is_none());
    }
}
