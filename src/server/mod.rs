//! HTTP server for Dossier

pub mod http;

pub use http::{run, AppState, BoxBody, StorageMode};
