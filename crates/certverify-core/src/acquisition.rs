//! Text acquisition
//!
//! Reads the embedded text layer of a PDF when it has one and falls back to
//! OCR over rendered pages otherwise. Rendered pages are kept so the visual
//! checks can reuse the first one.
//!
//! # Example
//! ```no_run
//! use certverify_core::acquisition::acquire_pdf_text;
//! use certverify_core::{Document, PdftoppmRenderer, TesseractOcr};
//!
//! # fn example() -> Result<(), certverify_core::VerifierError> {
//! let document = Document::open("marksheet.pdf")?;
//! let acquired = acquire_pdf_text(
//!     &document,
//!     &PdftoppmRenderer::default(),
//!     &TesseractOcr::default(),
//! );
//! println!("{:?}: {} chars", acquired.source, acquired.text.len());
//! # Ok(())
//! # }
//! ```

use std::panic::{self, AssertUnwindSafe};

use image::DynamicImage;
use pdf_extract::extract_text_from_mem;
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::VerifierError;
use crate::ocr::{recognize_or_degrade, OcrEngine};
use crate::outcome::StepOutcome;
use crate::render::{render_or_degrade, PageRenderer};

/// Where the document text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF's own text layer
    Embedded,
    /// OCR over rendered pages or the submitted image
    Ocr,
    /// Nothing could be read
    None,
}

/// Text plus the page rasters produced while getting it
#[derive(Debug, Clone)]
pub struct AcquiredText {
    pub text: String,
    /// Rendered pages (PDF) or the decoded image, in order
    pub pages: Vec<DynamicImage>,
    pub source: TextSource,
    /// Reasons for any step that degraded along the way
    pub issues: Vec<String>,
}

impl AcquiredText {
    pub fn first_page(&self) -> Option<&DynamicImage> {
        self.pages.first()
    }
}

/// Embedded text layer extraction
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract the native text layer.
    ///
    /// Returns `None` when extraction fails or yields only whitespace. Failures
    /// (including panics inside the extractor on malformed input) are logged
    /// and reported as degraded, never raised.
    pub fn extract_embedded_text(pdf_bytes: &[u8]) -> StepOutcome<Option<String>> {
        match Self::try_extract(pdf_bytes) {
            Ok(text) if text.trim().is_empty() => {
                debug!("PDF has no embedded text layer");
                StepOutcome::completed(None)
            }
            Ok(text) => StepOutcome::completed(Some(text)),
            Err(e) => {
                warn!(error = %e, "PDF text extraction failed");
                StepOutcome::degraded(None, e.to_string())
            }
        }
    }

    fn try_extract(pdf_bytes: &[u8]) -> Result<String, VerifierError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| extract_text_from_mem(pdf_bytes)));
        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(VerifierError::Extraction(e.to_string())),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "extractor panicked".to_string());
                Err(VerifierError::Extraction(message))
            }
        }
    }
}

/// Acquire text from a PDF: embedded layer first, OCR of every rendered page
/// otherwise. Pages are always rendered for the visual checks.
pub fn acquire_pdf_text(
    document: &Document,
    renderer: &dyn PageRenderer,
    ocr: &dyn OcrEngine,
) -> AcquiredText {
    let mut issues = Vec::new();

    let embedded = PdfExtractor::extract_embedded_text(&document.bytes);
    if let Some(reason) = embedded.reason() {
        issues.push(format!("text extraction: {}", reason));
    }

    let rendered = render_or_degrade(renderer, &document.path);
    if let Some(reason) = rendered.reason() {
        issues.push(format!("page rendering: {}", reason));
    }
    let pages = rendered.into_value();

    if let Some(text) = embedded.into_value() {
        return AcquiredText {
            text,
            pages,
            source: TextSource::Embedded,
            issues,
        };
    }

    if pages.is_empty() {
        return AcquiredText {
            text: String::new(),
            pages,
            source: TextSource::None,
            issues,
        };
    }

    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        let outcome = recognize_or_degrade(ocr, page);
        if let Some(reason) = outcome.reason() {
            issues.push(format!("ocr page {}: {}", index + 1, reason));
        }
        text.push_str(outcome.value());
    }
    debug!(pages = pages.len(), chars = text.len(), "OCR fallback complete");

    AcquiredText {
        text,
        pages,
        source: TextSource::Ocr,
        issues,
    }
}

/// Acquire text from a scanned image: OCR the image itself, which is also
/// the only page. An undecodable image is an input error.
pub fn acquire_image_text(
    document: &Document,
    ocr: &dyn OcrEngine,
) -> Result<AcquiredText, VerifierError> {
    let image = image::load_from_memory(&document.bytes)
        .map_err(|e| VerifierError::InvalidDocument(e.to_string()))?;

    let mut issues = Vec::new();
    let outcome = recognize_or_degrade(ocr, &image);
    if let Some(reason) = outcome.reason() {
        issues.push(format!("ocr: {}", reason));
    }

    Ok(AcquiredText {
        text: outcome.into_value(),
        pages: vec![image],
        source: TextSource::Ocr,
        issues,
    })
}
