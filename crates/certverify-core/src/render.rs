//! PDF page rasterization
//!
//! Pages are rendered by poppler's `pdftoppm` into a request-scoped temporary
//! directory, loaded into memory, and the directory is removed when the call
//! returns (on every path).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::VerifierError;
use crate::outcome::StepOutcome;

/// Capability: rasterize every page of a PDF, in page order
pub trait PageRenderer: Send + Sync {
    fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, VerifierError>;
}

/// Render, degrading to an empty page list on failure
pub fn render_or_degrade(renderer: &dyn PageRenderer, pdf_path: &Path) -> StepOutcome<Vec<DynamicImage>> {
    match renderer.render_pages(pdf_path) {
        Ok(pages) if pages.is_empty() => {
            warn!(path = %pdf_path.display(), "PDF rendered to zero pages");
            StepOutcome::degraded(pages, "PDF rendered to zero pages")
        }
        Ok(pages) => StepOutcome::completed(pages),
        Err(e) => {
            warn!(path = %pdf_path.display(), error = %e, "PDF to image conversion failed");
            StepOutcome::degraded(Vec::new(), e.to_string())
        }
    }
}

/// `pdftoppm`-backed renderer
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Rendered page files in page order.
    ///
    /// pdftoppm zero-pads page numbers to a common width, so a lexical sort of
    /// the generated names is page order.
    fn collect_page_files(dir: &Path) -> Result<Vec<PathBuf>, VerifierError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
            .collect();
        files.sort();
        Ok(files)
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new("pdftoppm", 300)
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, VerifierError> {
        let binary = which::which(&self.binary)
            .map_err(|_| VerifierError::tool(&self.binary, "executable not found on PATH"))?;

        let tmpdir = tempfile::tempdir()?;
        let prefix = tmpdir.path().join("page");

        debug!(path = %pdf_path.display(), dpi = self.dpi, "Rendering PDF pages");
        let output = Command::new(binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerifierError::tool(&self.binary, stderr.trim().to_string()));
        }

        let pages = Self::collect_page_files(tmpdir.path())?
            .iter()
            .map(|file| image::open(file).map_err(VerifierError::from))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(pages = pages.len(), "Rendered PDF pages");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render_pages(&self, _pdf_path: &Path) -> Result<Vec<DynamicImage>, VerifierError> {
            Err(VerifierError::tool("pdftoppm", "Syntax Error: Couldn't read xref table"))
        }
    }

    #[test]
    fn test_missing_binary_is_tool_error() {
        let renderer = PdftoppmRenderer::new("certverify-no-such-pdftoppm", 300);
        let err = renderer.render_pages(Path::new("doc.pdf")).unwrap_err();
        assert!(matches!(err, VerifierError::ExternalTool { .. }));
    }

    #[test]
    fn test_render_failure_degrades_to_no_pages() {
        let outcome = render_or_degrade(&FailingRenderer, Path::new("doc.pdf"));
        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
        assert!(outcome.reason().unwrap().contains("xref"));
    }

    #[test]
    fn test_page_files_sorted_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = PdftoppmRenderer::collect_page_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }
}
