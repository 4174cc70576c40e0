//! Dossier - chunked file storage service
//!
//! Dossier persists arbitrary-length byte streams into MongoDB using the
//! chunked-blob convention (a `{bucket}.files` metadata collection plus a
//! `{bucket}.chunks` data collection) and streams them back over HTTP
//! without materializing whole files in memory.
//!
//! ## Services
//!
//! - **Store**: the blob store adapter (upload / download / delete per bucket)
//! - **Buckets**: independently configured namespaces (`uploads`,
//!   `applicationFiles`) sharing one MongoDB connection
//! - **HTTP**: hyper-based handlers mapping store results to status codes
//!   and streaming response bodies

pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use store::{Bucket, Download, DownloadStream, FileKey, MemoryBackend, MongoBackend, StorageBackend};
pub use types::{DossierError, Result};
