//! Certificate authenticity classification
//!
//! Classifies a school-leaving certificate (PDF or scanned image) as
//! "Likely Authentic" or "Suspicious" from three independent signals:
//!
//! - **Metadata**: editing-tool producers and modification dates in the PDF
//!   document information
//! - **Logo**: the issuing board's crest somewhere on the first page
//! - **Layout**: structural similarity of the first page to a blank template
//!
//! Candidate details and the subject list are extracted along the way from
//! the embedded text layer or, failing that, OCR.
//!
//! ```no_run
//! use certverify_core::{classify_document, VerifierConfig};
//!
//! # fn main() -> Result<(), certverify_core::VerifierError> {
//! let result = classify_document("marksheet.pdf", &VerifierConfig::default())?;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod fusion;
pub mod metadata;
pub mod ocr;
pub mod outcome;
pub mod pipeline;
pub mod render;
pub mod vision;

pub use acquisition::{AcquiredText, PdfExtractor, TextSource};
pub use config::VerifierConfig;
pub use document::{Document, DocumentKind};
pub use error::VerifierError;
pub use fields::{parse_details, FieldParser, ParsedFields, PositionalFieldParser, SubjectMap, SubjectMarker};
pub use fusion::{classify, Classification};
pub use metadata::MetadataInspector;
pub use ocr::{OcrEngine, TesseractOcr};
pub use outcome::StepOutcome;
pub use pipeline::{
    classify_document, CertificateVerifier, CertificateVerifierBuilder, ClassificationResult, PipelineReport,
};
pub use render::{PageRenderer, PdftoppmRenderer};
pub use vision::{LogoMatcher, ReferenceAssets, ReferenceBitmap, TemplateComparator, TemplateMatch};
