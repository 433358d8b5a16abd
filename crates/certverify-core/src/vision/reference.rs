//! Reference bitmaps
//!
//! The logo and layout template are loaded once, converted to grayscale and
//! shared read-only between requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use tracing::{info, warn};

use crate::config::VerifierConfig;
use crate::error::VerifierError;

/// One reference bitmap and where it was expected on disk
#[derive(Debug, Clone)]
pub struct ReferenceBitmap {
    path: PathBuf,
    image: Option<Arc<GrayImage>>,
}

impl ReferenceBitmap {
    /// Load from disk. A missing or unreadable file is recorded, not raised:
    /// every check that needs it will fail with `ResourceMissing`.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let image = if path.exists() {
            match image::open(&path) {
                Ok(img) => Some(Arc::new(img.to_luma8())),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Reference bitmap unreadable");
                    None
                }
            }
        } else {
            warn!(path = %path.display(), "Reference bitmap not found");
            None
        };
        Self { path, image }
    }

    /// Wrap an already decoded bitmap
    pub fn from_image(path: impl Into<PathBuf>, image: GrayImage) -> Self {
        Self {
            path: path.into(),
            image: Some(Arc::new(image)),
        }
    }

    /// A reference that is known to be absent
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.image.is_some()
    }

    /// The bitmap, or `ResourceMissing`
    pub fn require(&self) -> Result<&GrayImage, VerifierError> {
        self.image
            .as_deref()
            .ok_or_else(|| VerifierError::ResourceMissing(self.path.clone()))
    }
}

/// Logo and layout template used by the visual checks
#[derive(Debug, Clone)]
pub struct ReferenceAssets {
    pub logo: ReferenceBitmap,
    pub template: ReferenceBitmap,
}

impl ReferenceAssets {
    /// Load both bitmaps named by the configuration
    pub fn load(config: &VerifierConfig) -> Self {
        let assets = Self {
            logo: ReferenceBitmap::load(&config.logo_path),
            template: ReferenceBitmap::load(&config.template_path),
        };
        info!(
            logo = assets.logo.is_present(),
            template = assets.template.is_present(),
            "Reference assets loaded"
        );
        assets
    }

    pub fn new(logo: ReferenceBitmap, template: ReferenceBitmap) -> Self {
        Self { logo, template }
    }

    /// Startup check: fail if either bitmap is unavailable
    pub fn ensure_present(&self) -> Result<(), VerifierError> {
        self.logo.require()?;
        self.template.require()?;
        Ok(())
    }
}
