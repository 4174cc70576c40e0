//! Download stream
//!
//! Adapts the backend's chunk cursor into a pull-based byte stream for the
//! HTTP response body. Each poll yields the next chunk's bytes, end-of-stream
//! after the last chunk, or a `ReadFailed` that terminates the stream. The
//! whole file is never buffered; backpressure is the consumer's poll rate.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::store::backend::ChunkStream;
use crate::types::{DossierError, Result};

/// Lazy byte stream over one stored file.
///
/// Verifies that chunks arrive contiguously from sequence 0 and that the
/// delivered byte count matches the committed length. Dropping the stream
/// drops the underlying cursor; nothing is fetched after cancellation.
pub struct DownloadStream {
    chunks: ChunkStream,
    next_n: u32,
    remaining: u64,
    done: bool,
}

impl DownloadStream {
    /// Wrap a chunk cursor for a file with the given committed length
    pub fn new(chunks: ChunkStream, length: u64) -> Self {
        Self {
            chunks,
            next_n: 0,
            remaining: length,
            done: false,
        }
    }

    /// Bytes not yet yielded
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Stream for DownloadStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.chunks).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                this.done = true;
                if this.remaining > 0 {
                    Poll::Ready(Some(Err(DossierError::ReadFailed(format!(
                        "chunk set truncated: {} bytes missing",
                        this.remaining
                    )))))
                } else {
                    Poll::Ready(None)
                }
            }
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Some(Ok(chunk))) => {
                if chunk.n != this.next_n {
                    this.done = true;
                    return Poll::Ready(Some(Err(DossierError::ReadFailed(format!(
                        "chunk sequence gap: expected {}, got {}",
                        this.next_n, chunk.n
                    )))));
                }

                let len = chunk.len() as u64;
                if len > this.remaining {
                    this.done = true;
                    return Poll::Ready(Some(Err(DossierError::ReadFailed(format!(
                        "chunk {} exceeds declared length by {} bytes",
                        chunk.n,
                        len - this.remaining
                    )))));
                }

                this.next_n += 1;
                this.remaining -= len;
                Poll::Ready(Some(Ok(Bytes::from(chunk.data.bytes))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ChunkDoc;
    use bson::oid::ObjectId;
    use futures::StreamExt;

    fn chunk_stream(chunks: Vec<Result<ChunkDoc>>) -> ChunkStream {
        futures::stream::iter(chunks).boxed()
    }

    #[tokio::test]
    async fn test_yields_chunks_in_order() {
        let id = ObjectId::new();
        let stream = chunk_stream(vec![
            Ok(ChunkDoc::new(id, 0, vec![1, 2])),
            Ok(ChunkDoc::new(id, 1, vec![3])),
        ]);
        let mut download = DownloadStream::new(stream, 3);

        assert_eq!(download.next().await.unwrap().unwrap().as_ref(), &[1, 2]);
        assert_eq!(download.next().await.unwrap().unwrap().as_ref(), &[3]);
        assert!(download.next().await.is_none());
        assert_eq!(download.remaining(), 0);
    }

    #[tokio::test]
    async fn test_empty_file_ends_immediately() {
        let mut download = DownloadStream::new(chunk_stream(vec![]), 0);
        assert!(download.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sequence_gap_is_read_failure() {
        let id = ObjectId::new();
        let stream = chunk_stream(vec![
            Ok(ChunkDoc::new(id, 0, vec![1])),
            Ok(ChunkDoc::new(id, 2, vec![2])),
        ]);
        let mut download = DownloadStream::new(stream, 2);

        assert!(download.next().await.unwrap().is_ok());
        let err = download.next().await.unwrap().unwrap_err();
        assert!(matches!(err, DossierError::ReadFailed(_)));
        // stream is terminated after the error
        assert!(download.next().await.is_none());
    }

    #[tokio::test]
    async fn test_truncated_chunk_set_is_read_failure() {
        let id = ObjectId::new();
        let stream = chunk_stream(vec![Ok(ChunkDoc::new(id, 0, vec![1, 2]))]);
        let mut download = DownloadStream::new(stream, 5);

        assert!(download.next().await.unwrap().is_ok());
        let err = download.next().await.unwrap().unwrap_err();
        assert!(matches!(err, DossierError::ReadFailed(_)));
    }

    #[tokio::test]
    async fn test_overlong_chunk_is_read_failure() {
        let id = ObjectId::new();
        let stream = chunk_stream(vec![Ok(ChunkDoc::new(id, 0, vec![0u8; 10]))]);
        let mut download = DownloadStream::new(stream, 4);

        let err = download.next().await.unwrap().unwrap_err();
        assert!(matches!(err, DossierError::ReadFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_error_terminates_stream() {
        let id = ObjectId::new();
        let stream = chunk_stream(vec![
            Ok(ChunkDoc::new(id, 0, vec![1])),
            Err(DossierError::ReadFailed("cursor lost".into())),
            Ok(ChunkDoc::new(id, 1, vec![2])),
        ]);
        let mut download = DownloadStream::new(stream, 2);

        assert!(download.next().await.unwrap().is_ok());
        assert!(download.next().await.unwrap().is_err());
        assert!(download.next().await.is_none());
    }
}
