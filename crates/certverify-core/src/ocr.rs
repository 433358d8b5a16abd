//! Optical character recognition for scanned pages

use std::process::Command;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::VerifierError;
use crate::outcome::StepOutcome;

/// Capability: turn a page bitmap into text. Best effort; empty text is a
/// valid answer.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, VerifierError>;
}

/// Recognize, degrading to empty text on failure
pub fn recognize_or_degrade(engine: &dyn OcrEngine, image: &DynamicImage) -> StepOutcome<String> {
    match engine.recognize(image) {
        Ok(text) => StepOutcome::completed(text),
        Err(e) => {
            warn!(error = %e, "OCR failed");
            StepOutcome::degraded(String::new(), e.to_string())
        }
    }
}

/// `tesseract` command-line OCR with default page segmentation
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            language,
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", None)
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, VerifierError> {
        let binary = which::which(&self.binary)
            .map_err(|_| VerifierError::tool(&self.binary, "executable not found on PATH"))?;

        let input = tempfile::Builder::new()
            .prefix("certverify-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), image::ImageFormat::Png)?;

        let mut cmd = Command::new(binary);
        cmd.arg(input.path()).arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }

        let output = cmd.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerifierError::tool(&self.binary, stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "OCR produced text");
        Ok(text)
    }
}
