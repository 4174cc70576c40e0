//! Stored-file metadata document schema
//!
//! One document per uploaded file in `{bucket}.files`. Writing this document
//! is the commit that makes a file visible: readers never see a file whose
//! metadata has not been written, even while its chunks already exist.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name suffix for file metadata (`{bucket}.files`)
pub const FILES_SUFFIX: &str = "files";

/// File metadata document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileDoc {
    /// Generated identifier; unique and immutable once assigned
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Original display name
    pub filename: String,

    /// Declared content type
    #[serde(rename = "contentType")]
    pub content_type: String,

    /// Total byte length; equals the sum of stored chunk lengths
    pub length: u64,

    /// Chunk size the file was written with
    #[serde(rename = "chunkSize")]
    pub chunk_size: u32,

    /// Upload completion timestamp
    #[serde(rename = "uploadDate")]
    pub upload_date: DateTime,
}

impl FileDoc {
    /// Create a metadata document for a completed upload
    pub fn new(id: ObjectId, filename: String, content_type: String, length: u64, chunk_size: u32) -> Self {
        Self {
            id,
            filename,
            content_type,
            length,
            chunk_size,
            upload_date: DateTime::now(),
        }
    }

    /// Hex form of the identifier, as served at the HTTP boundary
    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }
}

impl IntoIndexes for FileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Name lookups resolve to the newest upload with that filename
            (
                doc! { "filename": 1, "uploadDate": 1 },
                Some(
                    IndexOptions::builder()
                        .name("filename_uploaddate_index".to_string())
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
    fn test_id_hex_round_trip() {
        let id = ObjectId::new();
        let file = FileDoc::new(id, "a.txt".into(), "text/plain".into(), 9, 255 * 1024);
        assert_eq!(ObjectId::parse_str(file.id_hex()).unwrap(), id);
    }

    #[test]
    fn test_bson_field_names() {
        let file = FileDoc::new(
            ObjectId::new(),
            "resume.pdf".into(),
            "application/pdf".into(),
            1024,
            255 * 1024,
        );
        let doc = bson::to_document(&file).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("contentType"));
        assert!(doc.contains_key("chunkSize"));
        assert!(doc.contains_key("uploadDate"));
        assert!(!doc.contains_key("content_type"));
    }
}
