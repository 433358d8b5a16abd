//! Logo presence check
//!
//! Slides the reference logo over the page and scores every placement with
//! zero-mean normalized cross-correlation. The logo is considered present if
//! any placement reaches the threshold. Placements are abandoned row by row
//! once they provably cannot reach it.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use tracing::debug;

use super::reference::ReferenceBitmap;
use super::{for_each_box_sum, to_grayscale};
use crate::error::VerifierError;

/// Default minimum correlation for a match
pub const DEFAULT_LOGO_THRESHOLD: f64 = 0.8;

/// Searches a page for the reference logo
#[derive(Debug, Clone)]
pub struct LogoMatcher {
    reference: ReferenceBitmap,
    threshold: f64,
}

impl LogoMatcher {
    pub fn new(reference: ReferenceBitmap, threshold: f64) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True if the logo appears anywhere on the page.
    ///
    /// # Errors
    /// `ResourceMissing` when the reference logo is unavailable.
    pub fn verify(&self, page: &DynamicImage) -> Result<bool, VerifierError> {
        let logo = self.reference.require()?;
        let page = to_grayscale(page);
        let logo = fit_within(logo, page.width(), page.height());

        let found = find_match(&page, &logo, self.threshold);
        match found {
            Some((x, y, score)) => debug!(x, y, score, "Logo found"),
            None => debug!(threshold = self.threshold, "Logo not found"),
        }
        Ok(found.is_some())
    }
}

/// Shrink `logo` per axis so it fits inside a `width` x `height` page.
/// Aspect ratio is not preserved.
fn fit_within(logo: &GrayImage, width: u32, height: u32) -> Cow<'_, GrayImage> {
    if logo.width() <= width && logo.height() <= height {
        return Cow::Borrowed(logo);
    }
    let (w, h) = (logo.width().min(width), logo.height().min(height));
    Cow::Owned(imageops::resize(logo, w, h, FilterType::Triangle))
}

/// Template with its mean removed, ready for correlation
struct CenteredTemplate {
    values: Vec<f64>,
    energy: f64,
    /// `tail_energy[r]` is the energy of rows `r..`
    tail_energy: Vec<f64>,
    width: u32,
    height: u32,
}

impl CenteredTemplate {
    fn new(template: &GrayImage) -> Self {
        let raw = template.as_raw();
        let n = raw.len().max(1) as f64;
        let mean = raw.iter().map(|&p| p as f64).sum::<f64>() / n;
        let values: Vec<f64> = raw.iter().map(|&p| p as f64 - mean).collect();
        let energy = values.iter().map(|v| v * v).sum();

        let mut tail_energy = vec![0.0; template.height() as usize + 1];
        if template.width() > 0 {
            let rows: Vec<f64> = values
                .chunks_exact(template.width() as usize)
                .map(|row| row.iter().map(|v| v * v).sum())
                .collect();
            for (r, row) in rows.iter().enumerate().rev() {
                tail_energy[r] = tail_energy[r + 1] + row;
            }
        }
        Self {
            values,
            energy,
            tail_energy,
            width: template.width(),
            height: template.height(),
        }
    }

    fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Correlation at (`x`, `y`) given the window's pixel sum and sum of
    /// squares. Flat windows or a flat template score 0.
    fn score(&self, image: &GrayImage, x: u32, y: u32, sum: f64, sum_sq: f64) -> f64 {
        self.score_above(image, x, y, sum, sum_sq, f64::NEG_INFINITY)
            .unwrap_or(-1.0)
    }

    /// Like [`Self::score`], but `None` as soon as the rows not yet
    /// correlated can no longer lift the score to `threshold`. Never rejects
    /// a placement whose exact score reaches it.
    fn score_above(&self, image: &GrayImage, x: u32, y: u32, sum: f64, sum_sq: f64, threshold: f64) -> Option<f64> {
        let area = self.area();
        let window_energy = sum_sq - sum * sum / area;
        if self.energy <= 0.0 || window_energy <= f64::EPSILON * sum_sq.max(1.0) {
            return (0.0 >= threshold).then_some(0.0);
        }
        let norm = (self.energy * window_energy).sqrt();
        let target = threshold * norm - 1e-9 * norm;
        let (mean, window_root) = (sum / area, window_energy.sqrt());

        let pixels = image.as_raw();
        let stride = image.width() as usize;
        let tw = self.width as usize;
        let mut cross = 0.0;
        for (ty, t_row) in self.values.chunks_exact(tw).enumerate() {
            let start = (y as usize + ty) * stride + x as usize;
            for (t, &p) in t_row.iter().zip(&pixels[start..start + tw]) {
                cross += t * (p as f64 - mean);
            }
            // Cauchy-Schwarz bound on the remaining rows
            if cross + self.tail_energy[ty + 1].sqrt() * window_root < target {
                return None;
            }
        }
        let score = (cross / norm).clamp(-1.0, 1.0);
        (score >= threshold).then_some(score)
    }

    /// Correlation at a single placement, computing the window sums directly
    fn score_at(&self, image: &GrayImage, x: u32, y: u32) -> f64 {
        let (mut sum, mut sum_sq) = (0.0, 0.0);
        for ty in 0..self.height {
            for tx in 0..self.width {
                let p = image.get_pixel(x + tx, y + ty)[0] as f64;
                sum += p;
                sum_sq += p * p;
            }
        }
        self.score(image, x, y, sum, sum_sq)
    }
}

/// Visit every placement of a `width` x `height` window inside `image` in
/// raster order with its pixel sum and sum of squares. `visit` returns
/// `false` to stop.
fn scan(image: &GrayImage, width: u32, height: u32, mut visit: impl FnMut(u32, u32, f64, f64) -> bool) {
    let pixels = image.as_raw();
    let stride = image.width() as usize;

    for_each_box_sum(
        image.width(),
        image.height(),
        width,
        height,
        |x, y| {
            let p = pixels[y as usize * stride + x as usize] as f64;
            [p, p * p]
        },
        |x, y, sums| visit(x, y, sums[0], sums[1]),
    );
}

/// First placement scoring at least `threshold`, as `(x, y, score)`.
/// Exhaustive, so it never misses a placement that reaches the threshold.
pub fn first_match(image: &GrayImage, template: &GrayImage, threshold: f64) -> Option<(u32, u32, f64)> {
    let centered = CenteredTemplate::new(template);
    let mut found = None;
    scan(image, template.width(), template.height(), |x, y, sum, sum_sq| {
        found = centered
            .score_above(image, x, y, sum, sum_sq, threshold)
            .map(|score| (x, y, score));
        found.is_none()
    });
    found
}

/// Highest placement score, or `None` if the template does not fit
pub fn best_match(image: &GrayImage, template: &GrayImage) -> Option<(u32, u32, f64)> {
    let centered = CenteredTemplate::new(template);
    let mut best: Option<(u32, u32, f64)> = None;
    scan(image, template.width(), template.height(), |x, y, sum, sum_sq| {
        let score = centered.score(image, x, y, sum, sum_sq);
        if best.map_or(true, |(_, _, s)| score > s) {
            best = Some((x, y, score));
        }
        true
    });
    best
}

/// Templates whose shorter side exceeds this are first searched coarse-to-fine
const COARSE_SIDE: u32 = 32;
/// How far below the threshold a coarse score may fall and still be refined
const COARSE_MARGIN: f64 = 0.15;
const MAX_CANDIDATES: usize = 16;

/// Same answer as [`first_match`] (some placement at or above `threshold`,
/// or `None`), found faster for large templates when the logo is present.
///
/// Large templates are first located on a downscaled copy of both images and
/// the best coarse candidates are scored at full resolution in a
/// neighbourhood of one coarse pixel. Downscaling blurs textured logos and
/// can hide them, so when no candidate confirms, the exhaustive scan decides.
pub fn find_match(image: &GrayImage, template: &GrayImage, threshold: f64) -> Option<(u32, u32, f64)> {
    if template.width() > image.width() || template.height() > image.height() {
        return None;
    }
    let factor = template.width().min(template.height()) / COARSE_SIDE;
    if factor > 1 {
        if let Some(found) = coarse_match(image, template, threshold, factor) {
            return Some(found);
        }
        debug!(factor, "Coarse logo search confirmed nothing, scanning exhaustively");
    }
    first_match(image, template, threshold)
}

fn coarse_match(image: &GrayImage, template: &GrayImage, threshold: f64, factor: u32) -> Option<(u32, u32, f64)> {
    let shrink = |img: &GrayImage| {
        imageops::resize(
            img,
            (img.width() / factor).max(1),
            (img.height() / factor).max(1),
            FilterType::Triangle,
        )
    };
    let (small_image, small_template) = (shrink(image), shrink(template));

    let small = CenteredTemplate::new(&small_template);
    let mut candidates = Vec::new();
    scan(&small_image, small.width, small.height, |x, y, sum, sum_sq| {
        if let Some(score) = small.score_above(&small_image, x, y, sum, sum_sq, threshold - COARSE_MARGIN) {
            candidates.push((x, y, score));
        }
        true
    });
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
    candidates.truncate(MAX_CANDIDATES);
    debug!(factor, candidates = candidates.len(), "Coarse logo search");

    let centered = CenteredTemplate::new(template);
    let max_x = image.width() - template.width();
    let max_y = image.height() - template.height();
    for (cx, cy, _) in candidates {
        let (x0, y0) = ((cx * factor).saturating_sub(factor), (cy * factor).saturating_sub(factor));
        let (x1, y1) = ((cx * factor + factor).min(max_x), (cy * factor + factor).min(max_y));
        for y in y0..=y1.max(y0) {
            for x in x0..=x1.max(x0) {
                if x > max_x || y > max_y {
                    continue;
                }
                let score = centered.score_at(image, x, y);
                if score >= threshold {
                    return Some((x, y, score));
                }
            }
        }
    }
    None
}
