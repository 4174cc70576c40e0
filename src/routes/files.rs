//! File storage routes
//!
//! - `POST /files/{bucket}` - Upload; body streamed in, name from
//!   `X-File-Name` header (fallback `?name=` query)
//! - `GET /files/{bucket}/{id-or-name}` - Download, body streamed chunk by
//!   chunk
//! - `HEAD /files/{bucket}/{id-or-name}` - Metadata headers only
//! - `DELETE /files/{bucket}/{id}` - Remove file and chunks
//!
//! Status mapping: `NotFound` 404, `InvalidInput` 400, storage failures
//! 500-class. Storage error detail is logged here, never echoed to callers.

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{BodyExt, BodyStream, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{header, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::server::{AppState, BoxBody};
use crate::store::FileKey;
use crate::types::DossierError;

/// Response from a completed upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub length: u64,
    pub bucket: String,
}

/// Response from a delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// Handle POST /files/{bucket}
///
/// Expects:
/// - Body: raw file bytes, read incrementally
/// - Header `X-File-Name` (or `?name=` query): display name, required
/// - Header `Content-Type`: declared content type, optional
pub async fn handle_upload(
    req: Request<Incoming>,
    state: Arc<AppState>,
    bucket_label: &str,
) -> Response<BoxBody> {
    let bucket = match state.bucket(bucket_label) {
        Some(b) => b,
        None => return unknown_bucket(bucket_label),
    };

    let name = match file_name_from(&req) {
        Some(n) => n,
        None => {
            return error_response(&DossierError::BadRequest(
                "missing X-File-Name header or name query parameter".into(),
            ))
        }
    };

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    debug!(
        bucket = %bucket.label(),
        filename = %name,
        content_type = %content_type,
        "Processing upload"
    );

    let source = BodyStream::new(req.into_body()).filter_map(|frame| async move {
        match frame {
            Ok(frame) => frame.into_data().ok().map(Ok),
            Err(e) => Some(Err(DossierError::BadRequest(format!(
                "request body error: {}",
                e
            )))),
        }
    });

    let id = match bucket.upload(&name, &content_type, source).await {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    // Re-read the committed metadata so the response carries the final length
    let file = match bucket.stat(&FileKey::Id(id)).await {
        Ok(f) => f,
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::CREATED,
        &UploadResponse {
            id: file.id_hex(),
            filename: file.filename,
            content_type: file.content_type,
            length: file.length,
            bucket: bucket.label().to_string(),
        },
    )
}

/// Handle GET /files/{bucket}/{id-or-name}
///
/// Streams the file back one chunk per pull; the whole file is never held
/// in memory. A mid-stream fetch error terminates the response body.
pub async fn handle_download(
    state: Arc<AppState>,
    bucket_label: &str,
    raw_key: &str,
) -> Response<BoxBody> {
    let bucket = match state.bucket(bucket_label) {
        Some(b) => b,
        None => return unknown_bucket(bucket_label),
    };

    let key = parse_key(raw_key);

    match bucket.open_download(&key).await {
        Ok(download) => {
            let file = download.file;
            let body = StreamBody::new(
                download
                    .stream
                    .map(|res| res.map(Frame::data).map_err(std::io::Error::other)),
            );

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, file.content_type.as_str())
                .header(header::CONTENT_LENGTH, file.length)
                .header(header::CONTENT_DISPOSITION, content_disposition(&file.filename))
                .header("X-File-Id", file.id_hex())
                .header("Access-Control-Allow-Origin", "*")
                .body(BodyExt::boxed_unsync(body))
                .unwrap()
        }
        Err(e) => error_response(&e),
    }
}

/// Handle HEAD /files/{bucket}/{id-or-name}
pub async fn handle_head(
    state: Arc<AppState>,
    bucket_label: &str,
    raw_key: &str,
) -> Response<BoxBody> {
    let bucket = match state.bucket(bucket_label) {
        Some(b) => b,
        None => return unknown_bucket(bucket_label),
    };

    match bucket.stat(&parse_key(raw_key)).await {
        Ok(file) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, file.content_type.as_str())
            .header(header::CONTENT_LENGTH, file.length)
            .header(header::CONTENT_DISPOSITION, content_disposition(&file.filename))
            .header("X-File-Id", file.id_hex())
            .header("Access-Control-Allow-Origin", "*")
            .body(empty_body())
            .unwrap(),
        Err(e) => error_response(&e),
    }
}

/// Handle DELETE /files/{bucket}/{id}
///
/// Deletes by identifier only; a malformed identifier is a 400, an unknown
/// one a 404 (never a silent no-op).
pub async fn handle_delete(
    state: Arc<AppState>,
    bucket_label: &str,
    raw_id: &str,
) -> Response<BoxBody> {
    let bucket = match state.bucket(bucket_label) {
        Some(b) => b,
        None => return unknown_bucket(bucket_label),
    };

    let id = match bson::oid::ObjectId::parse_str(raw_id) {
        Ok(id) => id,
        Err(_) => {
            return error_response(&DossierError::BadRequest(format!(
                "malformed file id '{}'",
                raw_id
            )))
        }
    };

    match bucket.delete(id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &DeleteResponse {
                deleted: true,
                id: id.to_hex(),
            },
        ),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Display name from `X-File-Name` header or `name` query parameter
fn file_name_from(req: &Request<Incoming>) -> Option<String> {
    if let Some(name) = req
        .headers()
        .get("X-File-Name")
        .and_then(|h| h.to_str().ok())
    {
        if !name.trim().is_empty() {
            return Some(name.to_string());
        }
    }

    query_param(req.uri().query(), "name").filter(|n| !n.trim().is_empty())
}

/// Extract and percent-decode one query parameter
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() == Some(key) {
            let raw = parts.next().unwrap_or("");
            return Some(
                urlencoding::decode(raw)
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| raw.to_string()),
            );
        }
    }
    None
}

/// Percent-decode a path segment and parse it as an id-or-name key
fn parse_key(raw: &str) -> FileKey {
    let decoded = urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    FileKey::parse(&decoded)
}

/// Quoted Content-Disposition value with unsafe characters replaced
fn content_disposition(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", sanitized)
}

fn unknown_bucket(label: &str) -> Response<BoxBody> {
    error_response(&DossierError::NotFound(format!("unknown bucket '{}'", label)))
}

fn empty_body() -> BoxBody {
    BodyExt::boxed_unsync(Full::new(Bytes::new()).map_err(|never| match never {}))
}

/// Create JSON response
fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<BoxBody> {
    let body = serde_json::to_string(data)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(BodyExt::boxed_unsync(
            Full::new(Bytes::from(body)).map_err(|never| match never {}),
        ))
        .unwrap()
}

/// Map a store error to a response with a sanitized body.
///
/// Full error detail lands in the log only.
pub fn error_response(err: &DossierError) -> Response<BoxBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "Storage operation failed");
    } else {
        warn!(error = %err, "Request rejected");
    }

    let body = serde_json::json!({ "error": err.client_message() });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(BodyExt::boxed_unsync(
            Full::new(Bytes::from(body.to_string())).map_err(|never| match never {}),
        ))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param(Some("name=resume.pdf&x=1"), "name").as_deref(),
            Some("resume.pdf")
        );
        assert_eq!(
            query_param(Some("name=my%20file.txt"), "name").as_deref(),
            Some("my file.txt")
        );
        assert_eq!(query_param(Some("other=1"), "name"), None);
        assert_eq!(query_param(None, "name"), None);
    }

    #[test]
    fn test_content_disposition_sanitizes() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("we\"ird\\name\n.txt"),
            "attachment; filename=\"we_ird_name_.txt\""
        );
    }

    #[test]
    fn test_unknown_bucket_is_not_found() {
        let resp = unknown_bucket("nope");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_key_decodes() {
        assert_eq!(
            parse_key("my%20file.txt"),
            FileKey::Name("my file.txt".to_string())
        );
        let id = bson::oid::ObjectId::new();
        assert_eq!(parse_key(&id.to_hex()), FileKey::Id(id));
    }
}
