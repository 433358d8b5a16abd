//! Error types for the certificate verification server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use certverify_core::VerifierError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Client sent something we cannot classify
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

impl From<VerifierError> for ServerError {
    fn from(err: VerifierError) -> Self {
        if err.is_client_error() {
            ServerError::BadRequest(err.to_string())
        } else {
            ServerError::Internal(err.to_string())
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
