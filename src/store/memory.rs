//! In-memory storage backend
//!
//! Backs dev mode (where MongoDB is optional) and the test suite. Chunks are
//! fetched lazily, one per pull, so the read path behaves like a cursor;
//! `stats()` exposes fetch counts.

use async_trait::async_trait;
use bson::oid::ObjectId;
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::db::schemas::{ChunkDoc, FileDoc};
use crate::store::backend::{ChunkStream, FileKey, StorageBackend};
use crate::types::{DossierError, Result};

#[derive(Default)]
struct MemoryState {
    files: HashMap<ObjectId, FileDoc>,
    chunks: HashMap<ObjectId, BTreeMap<u32, ChunkDoc>>,
}

/// Runtime counters for the in-memory backend
#[derive(Debug, Clone, Copy)]
pub struct MemoryStats {
    pub files: usize,
    pub chunks: usize,
    /// Individual chunk fetches served to download streams
    pub chunk_fetches: u64,
}

/// In-memory chunk and metadata storage for one bucket
#[derive(Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    chunk_fetches: Arc<AtomicU64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters
    pub fn stats(&self) -> MemoryStats {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        MemoryStats {
            files: state.files.len(),
            chunks: state.chunks.values().map(BTreeMap::len).sum(),
            chunk_fetches: self.chunk_fetches.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put_chunk(&self, chunk: ChunkDoc) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DossierError::WriteFailed("memory store lock poisoned".into()))?;

        let per_file = state.chunks.entry(chunk.files_id).or_default();
        if per_file.contains_key(&chunk.n) {
            // Mirrors the unique (files_id, n) index
            return Err(DossierError::WriteFailed(format!(
                "duplicate chunk {} for file {}",
                chunk.n,
                chunk.files_id.to_hex()
            )));
        }
        per_file.insert(chunk.n, chunk);
        Ok(())
    }

    async fn commit_file(&self, file: FileDoc) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DossierError::WriteFailed("memory store lock poisoned".into()))?;

        if state.files.contains_key(&file.id) {
            return Err(DossierError::WriteFailed(format!(
                "duplicate file id {}",
                file.id.to_hex()
            )));
        }
        state.files.insert(file.id, file);
        Ok(())
    }

    async fn find_file(&self, key: &FileKey) -> Result<Option<FileDoc>> {
        let state = self
            .state
            .lock()
            .map_err(|_| DossierError::ReadFailed("memory store lock poisoned".into()))?;

        let found = match key {
            FileKey::Id(id) => state.files.get(id).cloned(),
            FileKey::Name(name) => state
                .files
                .values()
                .filter(|f| &f.filename == name)
                .max_by_key(|f| f.upload_date)
                .cloned(),
        };

        Ok(found)
    }

    async fn open_chunks(&self, file_id: ObjectId) -> Result<ChunkStream> {
        let state = Arc::clone(&self.state);
        let fetches = Arc::clone(&self.chunk_fetches);

        // One map lookup per pull; a dropped stream fetches nothing further.
        let stream = futures::stream::unfold(0u32, move |n| {
            let state = Arc::clone(&state);
            let fetches = Arc::clone(&fetches);
            async move {
                let chunk = match state.lock() {
                    Ok(guard) => guard
                        .chunks
                        .get(&file_id)
                        .and_then(|per_file| per_file.get(&n))
                        .cloned(),
                    Err(_) => {
                        return Some((
                            Err(DossierError::ReadFailed("memory store lock poisoned".into())),
                            n,
                        ))
                    }
                };

                match chunk {
                    Some(c) => {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        Some((Ok(c), n + 1))
                    }
                    None => None,
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn remove_file(&self, file_id: ObjectId) -> Result<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DossierError::Database("memory store lock poisoned".into()))?;

        Ok(state.files.remove(&file_id).is_some())
    }

    async fn remove_chunks(&self, file_id: ObjectId) -> Result<u64> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DossierError::Database("memory store lock poisoned".into()))?;

        let removed = state
            .chunks
            .remove(&file_id)
            .map(|per_file| per_file.len() as u64)
            .unwrap_or(0);

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_chunks_fetched_lazily() {
        let backend = MemoryBackend::new();
        let file_id = ObjectId::new();

        for n in 0..3 {
            backend
                .put_chunk(ChunkDoc::new(file_id, n, vec![n as u8; 4]))
                .await
                .unwrap();
        }

        let mut stream = backend.open_chunks(file_id).await.unwrap();
        assert_eq!(backend.stats().chunk_fetches, 0);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.n, 0);
        assert_eq!(backend.stats().chunk_fetches, 1);

        drop(stream);
        assert_eq!(backend.stats().chunk_fetches, 1);
    }

    #[tokio::test]
    async fn test_duplicate_chunk_rejected() {
        let backend = MemoryBackend::new();
        let file_id = ObjectId::new();

        backend
            .put_chunk(ChunkDoc::new(file_id, 0, vec![1]))
            .await
            .unwrap();
        let err = backend
            .put_chunk(ChunkDoc::new(file_id, 0, vec![2]))
            .await
            .unwrap_err();
        assert!(matches!(err, DossierError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn test_name_lookup_prefers_newest() {
        let backend = MemoryBackend::new();

        let older = FileDoc {
            upload_date: bson::DateTime::from_millis(1_000),
            ..FileDoc::new(ObjectId::new(), "a.txt".into(), "text/plain".into(), 1, 64)
        };
        let newer = FileDoc {
            upload_date: bson::DateTime::from_millis(2_000),
            ..FileDoc::new(ObjectId::new(), "a.txt".into(), "text/plain".into(), 2, 64)
        };
        let newer_id = newer.id;

        backend.commit_file(older).await.unwrap();
        backend.commit_file(newer).await.unwrap();

        let found = backend
            .find_file(&FileKey::Name("a.txt".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newer_id);
    }
}
