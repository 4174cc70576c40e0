//! Dossier - chunked file storage service
//!
//! Stores uploaded files as fixed-size chunks in MongoDB and streams them
//! back without ever materializing a whole file in memory.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dossier::{
    config::Args,
    db::MongoClient,
    server::{self, AppState, StorageMode},
    store::{Bucket, MemoryBackend, MongoBackend, StorageBackend},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dossier={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Dossier - chunked file storage");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Database: {}", args.mongodb_db);
    info!(
        "Buckets: {} / {}",
        args.upload_bucket, args.application_bucket
    );
    info!("Chunk size: {} bytes", args.chunk_size_bytes);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode, where an in-memory
    // backend stands in)
    let (uploads_backend, applications_backend, storage): (
        Arc<dyn StorageBackend>,
        Arc<dyn StorageBackend>,
        StorageMode,
    ) = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            let uploads = MongoBackend::open(&client, &args.upload_bucket).await?;
            let applications = MongoBackend::open(&client, &args.application_bucket).await?;
            (Arc::new(uploads), Arc::new(applications), StorageMode::Mongo)
        }
        Err(e) => {
            if args.dev_mode {
                warn!(
                    "MongoDB connection failed (dev mode, using in-memory storage): {}",
                    e
                );
                (
                    Arc::new(MemoryBackend::new()),
                    Arc::new(MemoryBackend::new()),
                    StorageMode::Memory,
                )
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let uploads = Arc::new(Bucket::new(
        uploads_backend,
        &args.upload_bucket,
        args.chunk_size_bytes,
    ));
    let application_files = Arc::new(Bucket::new(
        applications_backend,
        &args.application_bucket,
        args.chunk_size_bytes,
    ));

    let state = Arc::new(AppState::new(args, uploads, application_files, storage));

    server::run(state).await?;

    Ok(())
}
