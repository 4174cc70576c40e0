//! Document schemas for Dossier
//!
//! Defines the chunked-blob document structures: one metadata document per
//! stored file plus ordered binary chunks, GridFS field conventions.

mod chunk;
mod file;

pub use chunk::{ChunkDoc, CHUNKS_SUFFIX};
pub use file::{FileDoc, FILES_SUFFIX};
