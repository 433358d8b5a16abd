//! Submitted document and file-type routing

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::VerifierError;

/// Container kind, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Route by extension (case-insensitive, leading dot optional)
    pub fn from_extension(ext: &str) -> Result<Self, VerifierError> {
        let normalized = ext.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" => Ok(DocumentKind::Image),
            _ => Err(VerifierError::UnsupportedFileType(format!(".{}", normalized))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, VerifierError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// A document under verification. Lives for a single request.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    /// Validate the extension, then read the file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VerifierError> {
        let path = path.as_ref();
        let kind = DocumentKind::from_path(path)?;
        let bytes = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            bytes,
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.kind == DocumentKind::Pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_routing() {
        assert_eq!(DocumentKind::from_extension(".pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension("PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension(".png").unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_extension(".JPG").unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_extension("jpeg").unwrap(), DocumentKind::Image);
    }

    #[test]
    fn test_unsupported_extensions() {
        for ext in [".txt", ".docx", ".tiff", ""] {
            let err = DocumentKind::from_extension(ext).unwrap_err();
            assert!(matches!(err, VerifierError::UnsupportedFileType(_)), "{ext}");
        }
    }

    #[test]
    fn test_open_rejects_extension_before_reading() {
        // The file does not exist; validation must fail first with the input error.
        let err = Document::open("/nonexistent/marksheet.gif").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_open_missing_supported_file_is_io_error() {
        let err = Document::open("/nonexistent/marksheet.pdf").unwrap_err();
        assert!(matches!(err, VerifierError::Io(_)));
    }
}
