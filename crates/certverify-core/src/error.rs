//! Error types for certificate verification

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while classifying a certificate
#[derive(Error, Debug)]
pub enum VerifierError {
    /// The file extension is not one of `.pdf`, `.png`, `.jpg`, `.jpeg`
    #[error("Unsupported file type '{0}'. Only PDF, PNG, JPG are allowed.")]
    UnsupportedFileType(String),

    /// A reference bitmap (logo or layout template) is not available
    #[error("Reference asset not found: {}", .0.display())]
    ResourceMissing(PathBuf),

    /// The submitted document itself cannot be decoded
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image too small for comparison: {width}x{height} (need at least {min}x{min})")]
    ImageTooSmall { width: u32, height: u32, min: u32 },

    #[error("PDF text extraction failed: {0}")]
    Extraction(String),

    #[error("Metadata check failed: {0}")]
    Metadata(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    /// True for errors caused by the submitted input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VerifierError::UnsupportedFileType(_) | VerifierError::InvalidDocument(_)
        )
    }

    pub(crate) fn tool(tool: &str, message: impl Into<String>) -> Self {
        VerifierError::ExternalTool {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for VerifierError {
    fn from(err: image::ImageError) -> Self {
        VerifierError::InvalidImage(err.to_string())
    }
}

impl From<lopdf::Error> for VerifierError {
    fn from(err: lopdf::Error) -> Self {
        VerifierError::Metadata(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_client_errors() {
        assert!(VerifierError::UnsupportedFileType(".txt".into()).is_client_error());
        assert!(VerifierError::InvalidDocument("truncated PNG".into()).is_client_error());
        assert!(!VerifierError::ResourceMissing(PathBuf::from("logo.png")).is_client_error());
        assert!(!VerifierError::Config("bad".into()).is_client_error());
    }

    #[test]
    fn test_resource_missing_message_names_path() {
        let err = VerifierError::ResourceMissing(PathBuf::from("assets/cbselogo.png"));
        assert_eq!(
            err.to_string(),
            "Reference asset not found: assets/cbselogo.png"
        );
    }
}
