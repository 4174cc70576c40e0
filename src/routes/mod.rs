//! HTTP routes for Dossier

pub mod files;
pub mod health;

pub use files::{handle_delete, handle_download, handle_head, handle_upload};
pub use health::{health_check, readiness_check, version_info};
