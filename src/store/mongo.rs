//! MongoDB storage backend
//!
//! One backend per bucket, over the `{bucket}.files` and `{bucket}.chunks`
//! collections. Indexes are applied once in [`MongoBackend::open`] at
//! startup.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::StreamExt;
use mongodb::Collection;
use tracing::info;

use crate::db::schemas::{ChunkDoc, FileDoc, CHUNKS_SUFFIX, FILES_SUFFIX};
use crate::db::MongoClient;
use crate::store::backend::{ChunkStream, FileKey, StorageBackend};
use crate::types::{DossierError, Result};

/// MongoDB-backed chunk and metadata storage for one bucket
pub struct MongoBackend {
    files: Collection<FileDoc>,
    chunks: Collection<ChunkDoc>,
}

impl MongoBackend {
    /// Open the backend for a bucket and apply its indexes.
    pub async fn open(client: &MongoClient, bucket: &str) -> Result<Self> {
        let files = client.collection::<FileDoc>(&format!("{}.{}", bucket, FILES_SUFFIX));
        let chunks = client.collection::<ChunkDoc>(&format!("{}.{}", bucket, CHUNKS_SUFFIX));

        client.apply_indexes(&files).await?;
        client.apply_indexes(&chunks).await?;

        info!(bucket = %bucket, "Storage bucket initialized");

        Ok(Self { files, chunks })
    }
}

#[async_trait]
impl StorageBackend for MongoBackend {
    async fn put_chunk(&self, chunk: ChunkDoc) -> Result<()> {
        self.chunks
            .insert_one(chunk)
            .await
            .map_err(|e| DossierError::WriteFailed(format!("chunk insert failed: {}", e)))?;
        Ok(())
    }

    async fn commit_file(&self, file: FileDoc) -> Result<()> {
        self.files
            .insert_one(file)
            .await
            .map_err(|e| DossierError::WriteFailed(format!("file commit failed: {}", e)))?;
        Ok(())
    }

    async fn find_file(&self, key: &FileKey) -> Result<Option<FileDoc>> {
        let result = match key {
            FileKey::Id(id) => self.files.find_one(doc! { "_id": id }).await,
            FileKey::Name(name) => {
                self.files
                    .find_one(doc! { "filename": name })
                    .sort(doc! { "uploadDate": -1 })
                    .await
            }
        };

        result.map_err(|e| DossierError::Database(format!("file lookup failed: {}", e)))
    }

    async fn open_chunks(&self, file_id: ObjectId) -> Result<ChunkStream> {
        let cursor = self
            .chunks
            .find(doc! { "files_id": file_id })
            .sort(doc! { "n": 1 })
            .await
            .map_err(|e| DossierError::ReadFailed(format!("chunk cursor open failed: {}", e)))?;

        // Cursor is consumed one document per poll; dropping it closes the
        // server-side cursor.
        let stream = cursor
            .map(|item| item.map_err(|e| DossierError::ReadFailed(format!("chunk fetch failed: {}", e))));

        Ok(stream.boxed())
    }

    async fn remove_file(&self, file_id: ObjectId) -> Result<bool> {
        let result = self
            .files
            .delete_one(doc! { "_id": file_id })
            .await
            .map_err(|e| DossierError::Database(format!("file delete failed: {}", e)))?;

        Ok(result.deleted_count > 0)
    }

    async fn remove_chunks(&self, file_id: ObjectId) -> Result<u64> {
        let result = self
            .chunks
            .delete_many(doc! { "files_id": file_id })
            .await
            .map_err(|e| DossierError::Database(format!("chunk delete failed: {}", e)))?;

        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    // Exercising this backend needs a running MongoDB instance; the adapter
    // semantics are covered against MemoryBackend in store::bucket and
    // store::stream tests.
}
