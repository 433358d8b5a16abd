//! Shared fixtures: synthetic certificates, reference bitmaps and stub
//! collaborators that stand in for pdftoppm and tesseract.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use certverify_core::{OcrEngine, PageRenderer, VerifierError};
use image::{DynamicImage, GrayImage, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const MARKSHEET_TEXT: &str = "\
CENTRAL BOARD OF SECONDARY EDUCATION
SENIOR SCHOOL CERTIFICATE EXAMINATION
Roll No
Candidate Name
Mother's Name
Father's Name
School's Name
12345678
ANANYA SHARMA
SUNITA SHARMA
RAJESH SHARMA
DELHI PUBLIC SCHOOL
SUB CODE
THEORY
PRAC
301 ENGLISH CORE
041 MATHEMATICS
042 PHYSICS
Result PASS";

/// Blank marksheet layout: header band and ruled text rows
pub fn layout(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let header = y < height / 8;
        let rule = y % 12 == 0 && x > width / 10 && x < width * 9 / 10;
        Luma([if header { 40 } else if rule { 90 } else { 250 }])
    })
}

/// Board crest stand-in: dark ring around a textured disc
pub fn crest(size: u32) -> GrayImage {
    let c = size as f64 / 2.0;
    let r = c * 0.8;
    GrayImage::from_fn(size, size, |x, y| {
        let d = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
        let value = if (d - r).abs() < 1.5 {
            15
        } else if d < r {
            (100 + (x * 7 + y * 13) % 120) as u8
        } else {
            250
        };
        Luma([value])
    })
}

/// A filled-in first page: the layout with the crest in the header
pub fn certificate_page() -> GrayImage {
    let mut page = layout(200, 280);
    image::imageops::replace(&mut page, &crest(24), 88, 4);
    page
}

/// Page with neither the crest nor the layout
pub fn forged_page() -> GrayImage {
    GrayImage::from_fn(200, 280, |x, y| Luma([((x * 31 + y * 17) % 251) as u8]))
}

/// Renderer returning fixed pages regardless of input
pub struct StubRenderer(pub Vec<GrayImage>);

impl PageRenderer for StubRenderer {
    fn render_pages(&self, _pdf_path: &Path) -> Result<Vec<DynamicImage>, VerifierError> {
        Ok(self.0.iter().cloned().map(DynamicImage::ImageLuma8).collect())
    }
}

/// OCR engine returning fixed text
pub struct StubOcr(pub &'static str);

impl OcrEngine for StubOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, VerifierError> {
        Ok(self.0.to_string())
    }
}

/// One-page PDF whose text layer holds `lines`, with an optional
/// document-information dictionary
pub fn marksheet_pdf(lines: &[&str], info: Option<Dictionary>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 760 - (i as i64) * 18;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![50.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(info) = info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Write `bytes` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Save a grayscale bitmap as PNG under `dir/name`
pub fn write_png(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}
