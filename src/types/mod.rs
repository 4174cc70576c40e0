//! Shared types for Dossier

mod error;

pub use error::{DossierError, Result};
