//! Classification pipeline
//!
//! Runs every check for one document and fuses the results:
//!
//! 1. Open the document; the extension decides PDF vs image
//! 2. Acquire text (embedded layer, OCR fallback) and page rasters
//! 3. Parse candidate fields and subjects
//! 4. Inspect container metadata
//! 5. Match the logo and compare the layout on the first page
//! 6. Fuse into a verdict
//!
//! Only input errors abort a request. Every other failure degrades the step
//! it happened in and is recorded in the [`PipelineReport`].

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::acquisition::{acquire_image_text, acquire_pdf_text, TextSource};
use crate::config::VerifierConfig;
use crate::document::{Document, DocumentKind};
use crate::error::VerifierError;
use crate::fields::{FieldParser, ParsedFields, PositionalFieldParser};
use crate::fusion::{classify, Classification};
use crate::metadata::MetadataInspector;
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::outcome::StepOutcome;
use crate::render::{PageRenderer, PdftoppmRenderer};
use crate::vision::{LogoMatcher, ReferenceAssets, TemplateComparator, TemplateMatch};

/// Result returned to callers. `report` carries diagnostics and is not part
/// of the serialized shape.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    pub details: ParsedFields,
    pub metadata_flags: Vec<String>,
    pub logo_verified: bool,
    pub template_verified: bool,
    #[serde(skip)]
    pub report: PipelineReport,
}

/// How each step went
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub input_file: String,
    pub text_source: TextSource,
    pub pages: usize,
    /// Problems hit while acquiring text
    pub text_issues: Vec<String>,
    pub metadata: StepOutcome<usize>,
    pub logo: StepOutcome<bool>,
    pub template: StepOutcome<TemplateMatch>,
}

impl PipelineReport {
    /// Human-readable summary for debug logs
    pub fn to_text(&self, result: &ClassificationResult) -> String {
        let mut output = String::new();

        output.push_str(&format!("Certificate Verification Report: {}\n", self.input_file));
        output.push_str(&"=".repeat(60));
        output.push_str("\n\n");

        output.push_str(&format!("Classification: {}\n", result.classification));
        output.push_str(&format!(
            "Text: {:?} ({} page{})\n\n",
            self.text_source,
            self.pages,
            if self.pages == 1 { "" } else { "s" }
        ));

        output.push_str("Checks:\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        let mark = |ok: bool| if ok { "✓ PASS" } else { "✗ FAIL" };
        output.push_str(&format!(
            "{} Metadata ({} flag{})\n",
            mark(result.metadata_flags.is_empty()),
            result.metadata_flags.len(),
            if result.metadata_flags.len() == 1 { "" } else { "s" }
        ));
        for flag in &result.metadata_flags {
            output.push_str(&format!("    {}\n", flag));
        }
        output.push_str(&format!("{} Logo\n", mark(result.logo_verified)));
        output.push_str(&format!(
            "{} Template (score {:.3})\n",
            mark(result.template_verified),
            self.template.value().score
        ));

        let degraded: Vec<String> = [
            self.metadata.reason().map(|r| format!("metadata: {}", r)),
            self.logo.reason().map(|r| format!("logo: {}", r)),
            self.template.reason().map(|r| format!("template: {}", r)),
        ]
        .into_iter()
        .flatten()
        .chain(self.text_issues.iter().cloned())
        .collect();

        if !degraded.is_empty() {
            output.push_str("\nDegraded Steps:\n");
            output.push_str(&"-".repeat(40));
            output.push('\n');
            for (i, issue) in degraded.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, issue));
            }
        }

        output
    }
}

/// Certificate classifier. Cheap to share: reference bitmaps sit behind an
/// `Arc` and every collaborator is `Send + Sync`.
pub struct CertificateVerifier {
    assets: Arc<ReferenceAssets>,
    renderer: Box<dyn PageRenderer>,
    ocr: Box<dyn OcrEngine>,
    parser: Box<dyn FieldParser>,
    logo_threshold: f64,
    template_threshold: f64,
}

impl CertificateVerifier {
    pub fn builder() -> CertificateVerifierBuilder {
        CertificateVerifierBuilder::default()
    }

    /// Verifier with the stock pdftoppm / tesseract collaborators
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn assets(&self) -> &ReferenceAssets {
        &self.assets
    }

    /// Classify the document at `path`.
    ///
    /// # Errors
    /// `UnsupportedFileType` for extensions other than pdf/png/jpg/jpeg,
    /// `Io` when the file cannot be read, `InvalidDocument` when an image
    /// upload cannot be decoded.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn classify_path<P: AsRef<Path>>(&self, path: P) -> Result<ClassificationResult, VerifierError> {
        let document = Document::open(path.as_ref())?;

        let acquired = match document.kind {
            DocumentKind::Pdf => acquire_pdf_text(&document, self.renderer.as_ref(), self.ocr.as_ref()),
            DocumentKind::Image => acquire_image_text(&document, self.ocr.as_ref())?,
        };

        let details = self.parser.parse(&acquired.text);

        let metadata = MetadataInspector::check(&document);
        let metadata_flags = metadata.value().clone();

        let (logo, template) = self.visual_checks(acquired.first_page());
        let logo_verified = *logo.value();
        let template_verified = template.value().verified;

        let classification = classify(&metadata_flags, logo_verified, template_verified);
        info!(
            %classification,
            source = ?acquired.source,
            flags = metadata_flags.len(),
            logo_verified,
            template_verified,
            "Document classified"
        );

        let report = PipelineReport {
            input_file: document.path.display().to_string(),
            text_source: acquired.source,
            pages: acquired.pages.len(),
            text_issues: acquired.issues,
            metadata: metadata.map(|flags| flags.len()),
            logo,
            template,
        };

        Ok(ClassificationResult {
            classification,
            details,
            metadata_flags,
            logo_verified,
            template_verified,
            report,
        })
    }

    /// Logo and layout checks on the first page. Without a page neither
    /// check runs and both count as failed.
    fn visual_checks(&self, page: Option<&DynamicImage>) -> (StepOutcome<bool>, StepOutcome<TemplateMatch>) {
        let Some(page) = page else {
            warn!("No page image available; skipping visual checks");
            return (
                StepOutcome::degraded(false, "no page image"),
                StepOutcome::degraded(TemplateMatch::unverified(), "no page image"),
            );
        };

        let logo = LogoMatcher::new(self.assets.logo.clone(), self.logo_threshold).verify(page);
        if let Err(e) = &logo {
            warn!(error = %e, "Logo check failed");
        }

        let template = TemplateComparator::new(self.assets.template.clone(), self.template_threshold).compare(page);
        if let Err(e) = &template {
            warn!(error = %e, "Template check failed");
        }

        (
            StepOutcome::from_result(logo, false),
            StepOutcome::from_result(template, TemplateMatch::unverified()),
        )
    }
}

/// Builder for [`CertificateVerifier`]. Anything not set falls back to the
/// defaults of [`VerifierConfig`].
#[derive(Default)]
pub struct CertificateVerifierBuilder {
    config: Option<VerifierConfig>,
    assets: Option<Arc<ReferenceAssets>>,
    renderer: Option<Box<dyn PageRenderer>>,
    ocr: Option<Box<dyn OcrEngine>>,
    parser: Option<Box<dyn FieldParser>>,
}

impl CertificateVerifierBuilder {
    /// Thresholds, asset paths and tool settings
    pub fn config(mut self, config: &VerifierConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    /// Already loaded reference bitmaps, shared between verifiers
    pub fn assets(mut self, assets: Arc<ReferenceAssets>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn renderer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn ocr(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    pub fn parser(mut self, parser: impl FieldParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Reference bitmaps are loaded from the configured paths unless given
    pub fn build(self) -> CertificateVerifier {
        let config = self.config.unwrap_or_default();
        let assets = self
            .assets
            .unwrap_or_else(|| Arc::new(ReferenceAssets::load(&config)));
        let renderer = self.renderer.unwrap_or_else(|| {
            Box::new(PdftoppmRenderer::new(config.pdftoppm_bin.clone(), config.render_dpi))
        });
        let ocr = self.ocr.unwrap_or_else(|| {
            Box::new(TesseractOcr::new(config.tesseract_bin.clone(), config.ocr_language.clone()))
        });
        let parser = self
            .parser
            .unwrap_or_else(|| Box::new(PositionalFieldParser::new()));

        CertificateVerifier {
            assets,
            renderer,
            ocr,
            parser,
            logo_threshold: config.logo_threshold,
            template_threshold: config.template_threshold,
        }
    }
}

/// One-shot classification with the stock collaborators. Reference bitmaps
/// are loaded on every call; long-running callers should keep a
/// [`CertificateVerifier`] instead.
pub fn classify_document<P: AsRef<Path>>(
    path: P,
    config: &VerifierConfig,
) -> Result<ClassificationResult, VerifierError> {
    CertificateVerifier::from_config(config).classify_path(path)
}
