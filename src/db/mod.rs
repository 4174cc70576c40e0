//! MongoDB access layer for Dossier

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient};
