//! Synthetic bitmaps for the vision tests

use image::{GrayImage, Luma};

/// Deterministic noise from a 32-bit LCG
pub fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    GrayImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        Luma([(state >> 24) as u8])
    })
}

/// A crest-like mark: dark ring, cross bars and a gradient fill
pub fn logo(width: u32, height: u32) -> GrayImage {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = cx.min(cy) * 0.8;
    GrayImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        let dist = (dx * dx + dy * dy).sqrt();
        let value = if (dist - radius).abs() < 1.5 {
            20
        } else if x == width / 2 || y == height / 2 {
            60
        } else if dist < radius {
            (120 + (x * 5 + y * 3) % 100) as u8
        } else {
            255
        };
        Luma([value])
    })
}

/// A page-like layout: white sheet with a header band and text-like rows
pub fn layout(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let header = y < height / 8;
        let row = (y / 6) % 3 == 0 && x > width / 10 && x < width * 9 / 10;
        let word_gap = (x / 9) % 4 == 3;
        let value = if header {
            40
        } else if row && !word_gap {
            30
        } else {
            250
        };
        Luma([value])
    })
}

/// `base` with `patch` copied in at (`left`, `top`)
pub fn paste(base: &GrayImage, patch: &GrayImage, left: u32, top: u32) -> GrayImage {
    let mut out = base.clone();
    image::imageops::replace(&mut out, patch, left as i64, top as i64);
    out
}
