//! Blob store adapter
//!
//! Persists arbitrary-length byte streams as ordered chunks plus a metadata
//! document, and streams them back one chunk per pull. The adapter is written
//! against the [`StorageBackend`] seam; MongoDB is the production backend and
//! an in-memory backend serves dev mode and tests.

pub mod backend;
pub mod bucket;
pub mod memory;
pub mod mongo;
pub mod stream;

pub use backend::{ChunkStream, FileKey, StorageBackend};
pub use bucket::{Bucket, Download};
pub use memory::{MemoryBackend, MemoryStats};
pub use mongo::MongoBackend;
pub use stream::DownloadStream;
