//! Configuration for Dossier
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Default chunk size: 255 KiB, the GridFS convention.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Dossier - chunked file storage service
#[derive(Parser, Debug, Clone)]
#[command(name = "dossier")]
#[command(about = "Chunked file storage service backed by MongoDB")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8090")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "dossier")]
    pub mongodb_db: String,

    /// Bucket name for general uploads (resumes, profile documents)
    #[arg(long, env = "UPLOAD_BUCKET", default_value = "uploads")]
    pub upload_bucket: String,

    /// Bucket name for job-application files
    #[arg(long, env = "APPLICATION_BUCKET", default_value = "applicationFiles")]
    pub application_bucket: String,

    /// Chunk size in bytes for stored files
    #[arg(long, env = "CHUNK_SIZE_BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size_bytes: usize,

    /// Enable development mode (in-memory storage, MongoDB optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size_bytes == 0 {
            return Err("CHUNK_SIZE_BYTES must be greater than zero".to_string());
        }

        // 16 MB is the BSON document ceiling; chunks must leave headroom
        // for the metadata fields around the binary payload.
        if self.chunk_size_bytes > 15 * 1024 * 1024 {
            return Err("CHUNK_SIZE_BYTES must not exceed 15 MiB".to_string());
        }

        if self.upload_bucket.is_empty() || self.application_bucket.is_empty() {
            return Err("bucket names must not be empty".to_string());
        }

        if self.upload_bucket == self.application_bucket {
            return Err("UPLOAD_BUCKET and APPLICATION_BUCKET must differ".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["dossier"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = base_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.upload_bucket, "uploads");
        assert_eq!(args.application_bucket, "applicationFiles");
        assert_eq!(args.chunk_size_bytes, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut args = base_args();
        args.chunk_size_bytes = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        let mut args = base_args();
        args.chunk_size_bytes = 16 * 1024 * 1024;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_colliding_buckets_rejected() {
        let mut args = base_args();
        args.application_bucket = args.upload_bucket.clone();
        assert!(args.validate().is_err());
    }
}
