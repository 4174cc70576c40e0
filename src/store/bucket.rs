//! Bucket adapter
//!
//! One `Bucket` per configured namespace (`uploads`, `applicationFiles`).
//! The write path re-chunks an incremental byte source into bounded pieces
//! and commits metadata last; the read path resolves a key and hands back a
//! lazy [`DownloadStream`]; delete removes metadata first, then chunks.

use bson::oid::ObjectId;
use bytes::{Bytes, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::schemas::{ChunkDoc, FileDoc};
use crate::store::backend::{FileKey, StorageBackend};
use crate::store::stream::DownloadStream;
use crate::types::{DossierError, Result};

/// An opened download: committed metadata plus the lazy byte stream
pub struct Download {
    pub file: FileDoc,
    pub stream: DownloadStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

/// Blob store adapter instance for one bucket
pub struct Bucket {
    backend: Arc<dyn StorageBackend>,
    label: String,
    chunk_size: usize,
}

impl Bucket {
    /// Create a bucket over a storage backend
    pub fn new(backend: Arc<dyn StorageBackend>, label: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            backend,
            label: label.into(),
            chunk_size,
        }
    }

    /// Bucket label, as it appears in request paths
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Chunk size files in this bucket are written with
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Persist an incremental byte source under a generated identifier.
    ///
    /// Source buffers are re-chunked into `chunk_size` pieces regardless of
    /// how the source slices them. All chunks are written before the
    /// metadata commit; an aborted upload leaves no visible file, only
    /// orphan chunks. An exhausted-with-zero-bytes source still creates a
    /// zero-length file.
    pub async fn upload<S>(&self, filename: &str, content_type: &str, source: S) -> Result<ObjectId>
    where
        S: Stream<Item = Result<Bytes>> + Send,
    {
        if filename.trim().is_empty() {
            return Err(DossierError::BadRequest("file name is required".into()));
        }

        let id = ObjectId::new();
        let mut pending = BytesMut::with_capacity(self.chunk_size);
        let mut next_n: u32 = 0;
        let mut length: u64 = 0;

        pin_mut!(source);

        while let Some(buf) = source.next().await {
            let mut buf = buf?;
            length += buf.len() as u64;

            while !buf.is_empty() {
                let take = (self.chunk_size - pending.len()).min(buf.len());
                pending.extend_from_slice(&buf.split_to(take));

                if pending.len() == self.chunk_size {
                    self.write_chunk(id, next_n, pending.split().freeze()).await?;
                    next_n += 1;
                }
            }
        }

        if !pending.is_empty() {
            self.write_chunk(id, next_n, pending.split().freeze()).await?;
            next_n += 1;
        }

        let file = FileDoc::new(
            id,
            filename.to_string(),
            content_type.to_string(),
            length,
            self.chunk_size as u32,
        );
        self.backend.commit_file(file).await?;

        info!(
            bucket = %self.label,
            id = %id.to_hex(),
            filename = %filename,
            length = length,
            chunks = next_n,
            "File stored"
        );

        Ok(id)
    }

    /// Resolve a key and open a lazy download.
    ///
    /// Fails with `NotFound` when no committed file matches; a new call
    /// re-issues the lookup and restarts chunk iteration from sequence 0.
    pub async fn open_download(&self, key: &FileKey) -> Result<Download> {
        let file = self
            .backend
            .find_file(key)
            .await?
            .ok_or_else(|| DossierError::NotFound(format!("no file for key '{}'", key)))?;

        let chunks = self.backend.open_chunks(file.id).await?;
        let stream = DownloadStream::new(chunks, file.length);

        debug!(
            bucket = %self.label,
            id = %file.id_hex(),
            length = file.length,
            "Download opened"
        );

        Ok(Download { file, stream })
    }

    /// Look up committed metadata without opening the chunk cursor
    pub async fn stat(&self, key: &FileKey) -> Result<FileDoc> {
        self.backend
            .find_file(key)
            .await?
            .ok_or_else(|| DossierError::NotFound(format!("no file for key '{}'", key)))
    }

    /// Remove a stored file and all of its chunks.
    ///
    /// An unknown identifier is a reported `NotFound`, never a silent no-op.
    pub async fn delete(&self, id: ObjectId) -> Result<()> {
        // Metadata first: readers stop seeing the file before its chunks go.
        let removed = self.backend.remove_file(id).await?;
        if !removed {
            return Err(DossierError::NotFound(format!(
                "no file with id '{}'",
                id.to_hex()
            )));
        }

        let chunks = self.backend.remove_chunks(id).await?;
        info!(bucket = %self.label, id = %id.to_hex(), chunks = chunks, "File deleted");

        Ok(())
    }

    async fn write_chunk(&self, id: ObjectId, n: u32, data: Bytes) -> Result<()> {
        debug!(bucket = %self.label, id = %id.to_hex(), n = n, len = data.len(), "Writing chunk");
        self.backend.put_chunk(ChunkDoc::new(id, n, data.to_vec())).await
    }
}
