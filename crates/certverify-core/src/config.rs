//! Verifier configuration
//!
//! Reference asset locations, match thresholds and external tool settings.
//! Loadable from TOML; every field has a default so an empty file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::VerifierError;

/// Settings for a [`CertificateVerifier`](crate::CertificateVerifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Reference logo bitmap searched for on the first page
    #[serde(default = "default_logo_path")]
    pub logo_path: PathBuf,

    /// Reference layout bitmap compared against the first page
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Minimum normalized cross-correlation for a logo match (default: 0.8)
    #[serde(default = "default_logo_threshold")]
    pub logo_threshold: f64,

    /// Minimum SSIM for a template match (default: 0.85)
    #[serde(default = "default_template_threshold")]
    pub template_threshold: f64,

    /// Rasterization resolution for PDF pages (default: 300)
    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,

    /// poppler `pdftoppm` executable
    #[serde(default = "default_pdftoppm_bin")]
    pub pdftoppm_bin: String,

    /// `tesseract` executable
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,

    /// Tesseract language (`-l`); tesseract's own default when unset
    #[serde(default)]
    pub ocr_language: Option<String>,
}

fn default_logo_path() -> PathBuf {
    PathBuf::from("cbselogo.png")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("class12cbse.png")
}

fn default_logo_threshold() -> f64 {
    0.8
}

fn default_template_threshold() -> f64 {
    0.85
}

fn default_render_dpi() -> u32 {
    300
}

fn default_pdftoppm_bin() -> String {
    "pdftoppm".to_string()
}

fn default_tesseract_bin() -> String {
    "tesseract".to_string()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            logo_path: default_logo_path(),
            template_path: default_template_path(),
            logo_threshold: default_logo_threshold(),
            template_threshold: default_template_threshold(),
            render_dpi: default_render_dpi(),
            pdftoppm_bin: default_pdftoppm_bin(),
            tesseract_bin: default_tesseract_bin(),
            ocr_language: None,
        }
    }
}

impl VerifierConfig {
    /// Load configuration from a TOML file
    ///
    /// Relative asset paths are kept as written; they resolve against the
    /// working directory of the running process.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), VerifierError> {
        if !(-1.0..=1.0).contains(&self.logo_threshold) {
            return Err(VerifierError::Config(format!(
                "logo_threshold must be within [-1, 1], got {}",
                self.logo_threshold
            )));
        }
        if !(-1.0..=1.0).contains(&self.template_threshold) {
            return Err(VerifierError::Config(format!(
                "template_threshold must be within [-1, 1], got {}",
                self.template_threshold
            )));
        }
        if self.render_dpi == 0 {
            return Err(VerifierError::Config("render_dpi must be positive".into()));
        }
        Ok(())
    }
}
