//! Error types for Dossier

use hyper::StatusCode;

/// Main error type for Dossier operations
#[derive(Debug, thiserror::Error)]
pub enum DossierError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage write failed: {0}")]
    WriteFailed(String),

    #[error("Storage read failed: {0}")]
    ReadFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DossierError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to serve to callers.
    ///
    /// Storage and database errors carry driver text that must not be echoed
    /// to untrusted clients; only request-shaped errors keep their detail.
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => format!("bad request: {}", msg),
            Self::NotFound(_) => "file not found".to_string(),
            Self::WriteFailed(_) => "storage write failed".to_string(),
            Self::ReadFailed(_) => "storage read failed".to_string(),
            Self::Database(_) => "storage unavailable".to_string(),
            Self::Config(_) => "internal configuration error".to_string(),
        }
    }

}

impl From<mongodb::error::Error> for DossierError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DossierError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

/// Result type alias for Dossier operations
pub type Result<T> = std::result::Result<T, DossierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DossierError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DossierError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DossierError::WriteFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DossierError::ReadFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_message_hides_storage_detail() {
        let err = DossierError::WriteFailed("E11000 duplicate key on dossier.uploads.chunks".into());
        assert!(!err.client_message().contains("E11000"));

        let err = DossierError::Database("connection refused to mongodb://internal:27017".into());
        assert!(!err.client_message().contains("27017"));
    }

    #[test]
    fn test_bad_request_keeps_detail() {
        let err = DossierError::BadRequest("file name is required".into());
        assert!(err.client_message().contains("file name is required"));
    }
}
