//! Chunk document schema
//!
//! Bounded-size slices of a stored file in `{bucket}.chunks`, ordered by a
//! sequence number starting at 0. Concatenated in sequence order they
//! reconstruct the original byte stream with no gaps or overlaps.

use bson::{doc, oid::ObjectId, spec::BinarySubtype, Binary, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name suffix for chunk data (`{bucket}.chunks`)
pub const CHUNKS_SUFFIX: &str = "chunks";

/// Chunk document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChunkDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Identifier of the owning file
    pub files_id: ObjectId,

    /// Sequence number, starting at 0
    pub n: u32,

    /// Chunk payload
    pub data: Binary,
}

impl ChunkDoc {
    /// Create a chunk for the given file and sequence number
    pub fn new(files_id: ObjectId, n: u32, bytes: Vec<u8>) -> Self {
        Self {
            id: None,
            files_id,
            n,
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            },
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.bytes.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.bytes.is_empty()
    }
}

impl IntoIndexes for ChunkDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One chunk per (file, sequence number); also drives ordered reads
            (
                doc! { "files_id": 1, "n": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("files_id_n_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_payload() {
        let chunk = ChunkDoc::new(ObjectId::new(), 0, vec![1, 2, 3]);
        assert_eq!(chunk.len(), 3);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.data.subtype, BinarySubtype::Generic);
    }

    #[test]
    fn test_bson_field_names() {
        let chunk = ChunkDoc::new(ObjectId::new(), 2, vec![0u8; 16]);
        let doc = bson::to_document(&chunk).unwrap();
        assert!(doc.contains_key("files_id"));
        assert!(doc.contains_key("n"));
        assert!(doc.contains_key("data"));
        // unset _id is omitted so MongoDB generates one on insert
        assert!(!doc.contains_key("_id"));
    }
}
