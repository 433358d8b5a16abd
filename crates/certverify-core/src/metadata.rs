//! Container metadata inspection
//!
//! Looks at the PDF document-information dictionary for fingerprints of
//! editing tools. Only PDFs carry this dictionary; images always yield no
//! flags.

use lopdf::{Dictionary, Document as PdfDocument, Object};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::VerifierError;
use crate::outcome::StepOutcome;

/// Producer substrings that indicate an image editor touched the file
/// (case-sensitive)
pub const EDITING_TOOL_MARKERS: &[&str] = &["Photoshop", "Adobe Illustrator"];

/// Document-info inspector
pub struct MetadataInspector;

impl MetadataInspector {
    /// Flags for a submitted document. Failures to open or read metadata are
    /// logged and yield no flags.
    pub fn check(document: &Document) -> StepOutcome<Vec<String>> {
        if !document.is_pdf() {
            return StepOutcome::completed(Vec::new());
        }

        match Self::flags_from_bytes(&document.bytes) {
            Ok(flags) => {
                debug!(count = flags.len(), "Metadata flags computed");
                StepOutcome::completed(flags)
            }
            Err(e) => {
                warn!(error = %e, "Metadata check failed");
                StepOutcome::degraded(Vec::new(), e.to_string())
            }
        }
    }

    /// Flags from raw PDF bytes, in a fixed order: producer first, then
    /// modification date
    pub fn flags_from_bytes(pdf_bytes: &[u8]) -> Result<Vec<String>, VerifierError> {
        let pdf = PdfDocument::load_mem(pdf_bytes)?;
        let mut flags = Vec::new();

        let Some(info) = Self::info_dictionary(&pdf)? else {
            return Ok(flags);
        };

        if let Some(producer) = Self::text_entry(&pdf, info, b"Producer")? {
            if EDITING_TOOL_MARKERS.iter().any(|m| producer.contains(m)) {
                flags.push(format!("Edited with {}", producer));
            }
        }

        // Presence alone is suspicious; the date itself is not evaluated
        if let Some(mod_date) = Self::text_entry(&pdf, info, b"ModDate")? {
            flags.push(format!("Modified: {}", mod_date));
        }

        Ok(flags)
    }

    fn info_dictionary(pdf: &PdfDocument) -> Result<Option<&Dictionary>, VerifierError> {
        let Ok(info) = pdf.trailer.get(b"Info") else {
            return Ok(None);
        };
        let info = resolve(pdf, info)?;
        Ok(Some(info.as_dict()?))
    }

    /// Entry as text. A null value counts as absent; other non-text values
    /// fall back to their debug rendering so a malformed entry never hides
    /// the remaining flags.
    fn text_entry(
        pdf: &PdfDocument,
        dict: &Dictionary,
        key: &[u8],
    ) -> Result<Option<String>, VerifierError> {
        let Ok(value) = dict.get(key) else {
            return Ok(None);
        };
        let text = match resolve(pdf, value)? {
            Object::Null => return Ok(None),
            Object::String(bytes, _) => decode_text_string(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            Object::Integer(i) => i.to_string(),
            Object::Real(r) => r.to_string(),
            Object::Boolean(b) => b.to_string(),
            other => format!("{:?}", other),
        };
        Ok(Some(text))
    }
}

fn resolve<'a>(pdf: &'a PdfDocument, object: &'a Object) -> Result<&'a Object, VerifierError> {
    match object {
        Object::Reference(id) => Ok(pdf.get_object(*id)?),
        other => Ok(other),
    }
}

/// Decode a PDF text string: UTF-16 with a byte-order mark, otherwise UTF-8,
/// otherwise single-byte (PDFDocEncoding is Latin-1 for printable text)
pub fn decode_text_string(bytes: &[u8]) -> String {
    let utf16 = |be: bool| -> String {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| {
                if be {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    };

    match bytes {
        [0xFE, 0xFF, ..] => utf16(true),
        [0xFF, 0xFE, ..] => utf16(false),
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use lopdf::{dictionary, Document as PdfDocument, Object};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// Minimal one-page PDF, optionally with a document-info dictionary
    fn create_test_pdf(info: Option<lopdf::Dictionary>) -> Vec<u8> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
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

    #[test]
    fn test_photoshop_producer_flagged() {
        let pdf = create_test_pdf(Some(dictionary! {
            "Producer" => Object::string_literal("Adobe Photoshop 23.0"),
        }));
        let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
        assert_eq!(flags, vec!["Edited with Adobe Photoshop 23.0".to_string()]);
        assert!(flags[0].contains("Photoshop"));
    }

    #[test]
    fn test_illustrator_producer_flagged() {
        let pdf = create_test_pdf(Some(dictionary! {
            "Producer" => Object::string_literal("Adobe Illustrator 27.1"),
        }));
        let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
        assert_eq!(flags, vec!["Edited with Adobe Illustrator 27.1".to_string()]);
    }

    #[test]
    fn test_benign_producer_not_flagged() {
        for producer in ["Microsoft Word", "photoshop lowercase", "Adobe Acrobat"] {
            let pdf = create_test_pdf(Some(dictionary! {
                "Producer" => Object::string_literal(producer),
            }));
            assert!(MetadataInspector::flags_from_bytes(&pdf).unwrap().is_empty(), "{producer}");
        }
    }

    #[test]
    fn test_mod_date_presence_flagged_after_producer() {
        let pdf = create_test_pdf(Some(dictionary! {
            "ModDate" => Object::string_literal("D:20240115103000+05'30'"),
            "Producer" => Object::string_literal("Adobe Photoshop 23.0"),
        }));
        let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
        assert_eq!(
            flags,
            vec![
                "Edited with Adobe Photoshop 23.0".to_string(),
                "Modified: D:20240115103000+05'30'".to_string(),
            ]
        );
    }

    #[test]
    fn test_null_producer_keeps_mod_date_flag() {
        let pdf = create_test_pdf(Some(dictionary! {
            "Producer" => Object::Null,
            "ModDate" => Object::string_literal("D:20240301120000Z"),
        }));
        let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
        assert_eq!(flags, vec!["Modified: D:20240301120000Z".to_string()]);
    }

    #[test]
    fn test_non_text_values_do_not_drop_flags() {
        for producer in [
            Object::Boolean(true),
            Object::Array(vec![Object::string_literal("Word")]),
            Object::Dictionary(dictionary! { "Name" => "Writer" }),
        ] {
            let pdf = create_test_pdf(Some(dictionary! {
                "Producer" => producer.clone(),
                "ModDate" => Object::string_literal("D:20240301120000Z"),
            }));
            let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
            assert_eq!(flags, vec!["Modified: D:20240301120000Z".to_string()], "{producer:?}");
        }
    }

    #[test]
    fn test_null_mod_date_is_absent() {
        let pdf = create_test_pdf(Some(dictionary! { "ModDate" => Object::Null }));
        assert!(MetadataInspector::flags_from_bytes(&pdf).unwrap().is_empty());
    }

    #[test]
    fn test_no_info_dictionary_yields_no_flags() {
        let pdf = create_test_pdf(None);
        assert!(MetadataInspector::flags_from_bytes(&pdf).unwrap().is_empty());
    }

    #[test]
    fn test_utf16_producer_decoded() {
        let mut encoded = vec![0xFE, 0xFF];
        for unit in "Adobe Photoshop CC".encode_utf16() {
            encoded.extend_from_slice(&unit.to_be_bytes());
        }
        let pdf = create_test_pdf(Some(dictionary! {
            "Producer" => Object::String(encoded, lopdf::StringFormat::Hexadecimal),
        }));
        let flags = MetadataInspector::flags_from_bytes(&pdf).unwrap();
        assert_eq!(flags, vec!["Edited with Adobe Photoshop CC".to_string()]);
    }

    #[test]
    fn test_corrupt_pdf_degrades_to_empty() {
        let document = Document {
            path: PathBuf::from("broken.pdf"),
            kind: DocumentKind::Pdf,
            bytes: b"%PDF-1.4 truncated".to_vec(),
        };
        let outcome = MetadataInspector::check(&document);
        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }

    #[test]
    fn test_images_have_no_metadata_flags() {
        let document = Document {
            path: PathBuf::from("scan.png"),
            kind: DocumentKind::Image,
            bytes: Vec::new(),
        };
        let outcome = MetadataInspector::check(&document);
        assert!(!outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }

    #[test]
    fn test_decode_text_string_fallbacks() {
        assert_eq!(decode_text_string(b"plain"), "plain");
        assert_eq!(decode_text_string(&[0x43, 0xE9]), "C\u{e9}");
        assert_eq!(decode_text_string(&[0xFF, 0xFE, 0x41, 0x00]), "A");
    }
}
