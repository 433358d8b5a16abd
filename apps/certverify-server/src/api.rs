//! API handlers for the certificate verification server
//!
//! - `GET /health`
//! - `POST /upload`: multipart form with one `file` part (PDF, PNG or JPEG)

use std::io::Write;
use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use certverify_core::{ClassificationResult, DocumentKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Multipart field carrying the document
pub const UPLOAD_FIELD: &str = "file";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "certverify-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Lower-cased extension (with dot) of an uploaded file name, if it is one we
/// accept
pub fn upload_suffix(file_name: &str) -> Result<String, ServerError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    DocumentKind::from_extension(&ext)?;
    Ok(format!(".{}", ext))
}

/// Handler: POST /upload
///
/// The upload is written to a temporary file that keeps the uploaded
/// extension, classified on the blocking pool, and removed afterwards.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ClassificationResult>, ServerError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ServerError::BadRequest(format!("Missing '{}' field", UPLOAD_FIELD)))?;
    let suffix = upload_suffix(&file_name)?;
    info!(file = %file_name, size = bytes.len(), "Upload received");

    let mut temp = tempfile::Builder::new()
        .prefix("certverify-upload-")
        .suffix(&suffix)
        .tempfile()?;
    temp.write_all(&bytes)?;
    temp.flush()?;

    let verifier = state.verifier.clone();
    let result = tokio::task::spawn_blocking(move || {
        let result = verifier.classify_path(temp.path());
        drop(temp);
        result
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Classification task failed: {}", e)))??;

    debug!(report = %result.report.to_text(&result), "Classification report");
    Ok(Json(result))
}
