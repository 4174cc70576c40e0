//! Storage backend seam
//!
//! The bucket adapter talks to the document store through this trait; the
//! MongoDB implementation lives in [`super::mongo`], the in-memory one in
//! [`super::memory`].

use async_trait::async_trait;
use bson::oid::ObjectId;
use futures::stream::BoxStream;

use crate::db::schemas::{ChunkDoc, FileDoc};
use crate::types::Result;

/// Lazy, ordered sequence of chunk documents for one file.
///
/// Dropping the stream releases the underlying cursor; no chunk fetch
/// continues after cancellation.
pub type ChunkStream = BoxStream<'static, Result<ChunkDoc>>;

/// Lookup key for the read path: generated identifier or display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKey {
    Id(ObjectId),
    Name(String),
}

impl FileKey {
    /// Parse an HTTP path segment: a 24-char hex string is an identifier,
    /// anything else is a display name.
    pub fn parse(raw: &str) -> Self {
        match ObjectId::parse_str(raw) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id.to_hex()),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Document-store operations behind one bucket.
///
/// Write-path contract: chunks land via `put_chunk` before `commit_file`
/// runs; the commit is the single atomic write that makes a file visible.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist one chunk. Errors surface as `WriteFailed`.
    async fn put_chunk(&self, chunk: ChunkDoc) -> Result<()>;

    /// Write the file metadata document, making the file visible to readers.
    async fn commit_file(&self, file: FileDoc) -> Result<()>;

    /// Look up file metadata by identifier or name.
    ///
    /// Name lookups resolve to the most recent upload with that name.
    async fn find_file(&self, key: &FileKey) -> Result<Option<FileDoc>>;

    /// Open a lazy cursor over the file's chunks in ascending sequence order.
    async fn open_chunks(&self, file_id: ObjectId) -> Result<ChunkStream>;

    /// Remove the file metadata document. Returns false when no such file
    /// exists.
    async fn remove_file(&self, file_id: ObjectId) -> Result<bool>;

    /// Remove every chunk belonging to the file. Returns the removed count.
    async fn remove_chunks(&self, file_id: ObjectId) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_parse_hex_id() {
        let id = ObjectId::new();
        assert_eq!(FileKey::parse(&id.to_hex()), FileKey::Id(id));
    }

    #[test]
    fn test_file_key_parse_name() {
        assert_eq!(
            FileKey::parse("resume.pdf"),
            FileKey::Name("resume.pdf".to_string())
        );
        // 24 chars but not hex
        assert_eq!(
            FileKey::parse("zzzzzzzzzzzzzzzzzzzzzzzz"),
            FileKey::Name("zzzzzzzzzzzzzzzzzzzzzzzz".to_string())
        );
    }
}
