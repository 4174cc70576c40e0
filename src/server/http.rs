//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Download bodies are
//! streamed, so response bodies are unsync trait objects rather than
//! buffered `Full` payloads.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes;
use crate::store::Bucket;
use crate::types::DossierError;

pub type BoxBody = http_body_util::combinators::UnsyncBoxBody<Bytes, std::io::Error>;

/// Which backend the buckets were built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Mongo,
    Memory,
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// General upload bucket
    pub uploads: Arc<Bucket>,
    /// Bucket for files attached to job applications
    pub application_files: Arc<Bucket>,
    /// Backend kind, reported by the health probes
    pub storage: StorageMode,
}

impl AppState {
    pub fn new(
        args: Args,
        uploads: Arc<Bucket>,
        application_files: Arc<Bucket>,
        storage: StorageMode,
    ) -> Self {
        Self {
            args,
            uploads,
            application_files,
            storage,
        }
    }

    /// Resolve a bucket by its path label
    pub fn bucket(&self, label: &str) -> Option<Arc<Bucket>> {
        if label == self.uploads.label() {
            Some(Arc::clone(&self.uploads))
        } else if label == self.application_files.label() {
            Some(Arc::clone(&self.application_files))
        } else {
            None
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), DossierError> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| DossierError::Config(format!("failed to bind {}: {}", state.args.listen, e)))?;

    info!(
        "Dossier listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    info!(
        "Serving buckets '{}' and '{}' ({} byte chunks)",
        state.uploads.label(),
        state.application_files.label(),
        state.args.chunk_size_bytes
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 if dossier is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Readiness probe - returns 200 once storage is attached
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            to_boxed(routes::readiness_check(Arc::clone(&state)))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // ====================================================================
        // File storage
        // POST   /files/{bucket}                 upload
        // GET    /files/{bucket}/{id-or-name}   download
        // HEAD   /files/{bucket}/{id-or-name}   metadata
        // DELETE /files/{bucket}/{id}           remove
        // ====================================================================
        (Method::POST, p) if p.starts_with("/files/") => match split_file_path(p) {
            Some((bucket, None)) => {
                let bucket = bucket.to_string();
                routes::handle_upload(req, Arc::clone(&state), &bucket).await
            }
            _ => to_boxed(not_found_response(&path)),
        },

        (Method::GET, p) if p.starts_with("/files/") => match split_file_path(p) {
            Some((bucket, Some(key))) => {
                routes::handle_download(Arc::clone(&state), bucket, key).await
            }
            _ => to_boxed(not_found_response(&path)),
        },

        (Method::HEAD, p) if p.starts_with("/files/") => match split_file_path(p) {
            Some((bucket, Some(key))) => {
                routes::handle_head(Arc::clone(&state), bucket, key).await
            }
            _ => to_boxed(not_found_response(&path)),
        },

        (Method::DELETE, p) if p.starts_with("/files/") => match split_file_path(p) {
            Some((bucket, Some(id))) => {
                routes::handle_delete(Arc::clone(&state), bucket, id).await
            }
            _ => to_boxed(not_found_response(&path)),
        },

        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Split `/files/{bucket}` or `/files/{bucket}/{key}` into its segments.
///
/// Rejects empty segments and keys containing further slashes.
fn split_file_path(path: &str) -> Option<(&str, Option<&str>)> {
    let rest = path.strip_prefix("/files/")?;
    if rest.is_empty() {
        return None;
    }

    match rest.split_once('/') {
        None => Some((rest, None)),
        Some((bucket, key)) => {
            if bucket.is_empty() || key.is_empty() || key.contains('/') {
                None
            } else {
                Some((bucket, Some(key)))
            }
        }
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed_unsync())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, DELETE, HEAD, OPTIONS",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_path() {
        assert_eq!(split_file_path("/files/uploads"), Some(("uploads", None)));
        assert_eq!(
            split_file_path("/files/uploads/abc123"),
            Some(("uploads", Some("abc123")))
        );
        assert_eq!(split_file_path("/files/"), None);
        assert_eq!(split_file_path("/files/uploads/"), None);
        assert_eq!(split_file_path("/files//abc"), None);
        assert_eq!(split_file_path("/files/uploads/a/b"), None);
        assert_eq!(split_file_path("/other"), None);
    }
}
