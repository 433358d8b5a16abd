//! Visual checks against fixed reference bitmaps
//!
//! - [`LogoMatcher`]: is the issuing body's logo present on the first page?
//! - [`TemplateComparator`]: does the page look like the expected layout?
//!
//! Both operate on 8-bit grayscale. Pure Rust over `image` buffers.

pub mod logo;
pub mod reference;
pub mod template;

pub use logo::LogoMatcher;
pub use reference::{ReferenceAssets, ReferenceBitmap};
pub use template::{TemplateComparator, TemplateMatch};

#[cfg(test)]
pub(crate) mod test_images;

use image::{DynamicImage, GrayImage};

/// Rec. 601 luma, as every decoder and renderer in the pipeline expects
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Sums of `N` per-pixel quantities over a sliding `win_w` x `win_h` box.
///
/// Computed one output row at a time from running column sums, so memory
/// stays proportional to the image width. `f` maps a pixel position to its
/// quantities; `visit` receives the top-left corner of each window with the
/// sums and returns `false` to stop early. Windows are visited row by row.
/// Quantities are expected to be integral, which keeps the running sums exact.
pub(crate) fn for_each_box_sum<const N: usize>(
    width: u32,
    height: u32,
    win_w: u32,
    win_h: u32,
    f: impl Fn(u32, u32) -> [f64; N],
    mut visit: impl FnMut(u32, u32, &[f64; N]) -> bool,
) {
    if win_w == 0 || win_h == 0 || win_w > width || win_h > height {
        return;
    }
    let w = width as usize;
    let ww = win_w as usize;
    let mut columns = vec![[0.0f64; N]; w];

    for y in 0..win_h {
        for (x, column) in columns.iter_mut().enumerate() {
            add_into(column, &f(x as u32, y), 1.0);
        }
    }

    for top in 0..=(height - win_h) {
        if top > 0 {
            let (leaving, entering) = (top - 1, top + win_h - 1);
            for (x, column) in columns.iter_mut().enumerate() {
                add_into(column, &f(x as u32, entering), 1.0);
                add_into(column, &f(x as u32, leaving), -1.0);
            }
        }

        let mut sums = [0.0f64; N];
        for column in &columns[..ww] {
            add_into(&mut sums, column, 1.0);
        }
        if !visit(0, top, &sums) {
            return;
        }
        for left in 1..=(w - ww) {
            add_into(&mut sums, &columns[left + ww - 1], 1.0);
            add_into(&mut sums, &columns[left - 1], -1.0);
            if !visit(left as u32, top, &sums) {
                return;
            }
        }
    }
}

fn add_into<const N: usize>(acc: &mut [f64; N], values: &[f64; N], sign: f64) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += sign * v;
    }
}
