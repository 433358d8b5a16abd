//! Layout comparison
//!
//! Compares the first page against a blank reference layout using mean
//! structural similarity (SSIM). The reference is stretched to the page size
//! first, so differences in resolution do not matter but differences in
//! aspect ratio do.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use tracing::debug;

use super::reference::ReferenceBitmap;
use super::{for_each_box_sum, to_grayscale};
use crate::error::VerifierError;

/// Default minimum mean SSIM for a match
pub const DEFAULT_TEMPLATE_THRESHOLD: f64 = 0.85;

/// Side of the square SSIM window
pub const SSIM_WINDOW: u32 = 7;

const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Outcome of a layout comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemplateMatch {
    pub verified: bool,
    /// Mean SSIM in [-1, 1]
    pub score: f64,
}

impl TemplateMatch {
    /// A check that could not run
    pub fn unverified() -> Self {
        Self {
            verified: false,
            score: 0.0,
        }
    }
}

/// Compares pages against the reference layout
#[derive(Debug, Clone)]
pub struct TemplateComparator {
    reference: ReferenceBitmap,
    threshold: f64,
}

impl TemplateComparator {
    pub fn new(reference: ReferenceBitmap, threshold: f64) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score the page against the reference layout.
    ///
    /// # Errors
    /// `ResourceMissing` when the reference is unavailable, `ImageTooSmall`
    /// when the page is narrower or shorter than the SSIM window.
    pub fn compare(&self, page: &DynamicImage) -> Result<TemplateMatch, VerifierError> {
        let template = self.reference.require()?;
        let page = to_grayscale(page);
        let template = stretch_to(template, page.width(), page.height());

        let score = structural_similarity(&page, &template)?;
        let verified = score >= self.threshold;
        debug!(score, threshold = self.threshold, verified, "Template compared");
        Ok(TemplateMatch { verified, score })
    }
}

fn stretch_to(image: &GrayImage, width: u32, height: u32) -> Cow<'_, GrayImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
    }
}

/// Mean SSIM of two equally sized grayscale images.
///
/// Uses a 7x7 uniform window with sample covariance, averaged over every
/// window that lies fully inside the image.
///
/// # Errors
/// `InvalidImage` on a size mismatch, `ImageTooSmall` when either side is
/// shorter than the window.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<f64, VerifierError> {
    if a.dimensions() != b.dimensions() {
        return Err(VerifierError::InvalidImage(format!(
            "SSIM inputs differ in size: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let (width, height) = a.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(VerifierError::ImageTooSmall {
            width,
            height,
            min: SSIM_WINDOW,
        });
    }

    let n = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let (pa, pb) = (a.as_raw(), b.as_raw());
    let stride = width as usize;

    let mut total = 0.0;
    let mut windows = 0usize;
    for_each_box_sum(
        width,
        height,
        SSIM_WINDOW,
        SSIM_WINDOW,
        |x, y| {
            let i = y as usize * stride + x as usize;
            let (x, y) = (pa[i] as f64, pb[i] as f64);
            [x, y, x * x, y * y, x * y]
        },
        |_, _, sums| {
            let [sx, sy, sxx, syy, sxy] = (*sums).map(|s| s / n);
            let var_x = cov_norm * (sxx - sx * sx);
            let var_y = cov_norm * (syy - sy * sy);
            let cov = cov_norm * (sxy - sx * sy);

            let numerator = (2.0 * sx * sy + c1) * (2.0 * cov + c2);
            let denominator = (sx * sx + sy * sy + c1) * (var_x + var_y + c2);
            total += numerator / denominator;
            windows += 1;
            true
        },
    );

    Ok(total / windows as f64)
}
