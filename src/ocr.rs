//! OCR extraction: rasterize one page and recognize its text
//!
//! The recognition engine sits behind the [`OcrEngine`] trait so the
//! orchestrator (and tests) can swap it out. The default implementation
//! shells out to `pdftoppm` for rasterization and `tesseract` for
//! recognition, with `--psm 6` for a layout-aware single-column assumption.

use crate::DocError;
use std::path::Path;
use std::process::Command;

/// Rasterizes one page of the document at `path` and returns recognized text.
///
/// Failures are per-page: the orchestrator degrades the page to an empty
/// fragment and continues with the rest of the document.
pub trait OcrEngine {
    fn recognize_page(&self, path: &Path, page: u32) -> Result<String, DocError>;
}

/// Run OCR on one page and wrap the result in its page-tagged header.
pub fn extract_page_ocr(
    engine: &dyn OcrEngine,
    path: &Path,
    page: u32,
) -> Result<String, DocError> {
    let text = engine.recognize_page(path, page)?;
    Ok(format!(
        "--- OCR Extracted Text (Page {}) ---\n{}\n",
        page,
        text.trim()
    ))
}

/// Default engine: `pdftoppm` rasterization into a scratch directory,
/// recognition with `tesseract --psm 6`. The raster is discarded with the
/// directory when recognition finishes.
pub struct TesseractOcr {
    /// Rasterization resolution in DPI.
    pub dpi: u32,
    /// Tesseract page segmentation mode.
    pub psm: u32,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self { dpi: 300, psm: 6 }
    }
}

impl TesseractOcr {
    fn ocr_error(page: u32, reason: impl Into<String>) -> DocError {
        DocError::Ocr {
            page,
            reason: reason.into(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_page(&self, path: &Path, page: u32) -> Result<String, DocError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| Self::ocr_error(page, format!("scratch dir: {}", e)))?;
        let prefix = scratch.path().join("page");

        let status = Command::new("pdftoppm")
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix)
            .status()
            .map_err(|e| Self::ocr_error(page, format!("pdftoppm: {}", e)))?;

        if !status.success() {
            return Err(Self::ocr_error(page, format!("pdftoppm exited with {}", status)));
        }

        // pdftoppm zero-pads the page number in the output name depending on
        // the document size, so locate the raster instead of predicting it.
        let raster = std::fs::read_dir(scratch.path())
            .map_err(|e| Self::ocr_error(page, format!("scratch dir: {}", e)))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .ok_or_else(|| Self::ocr_error(page, "rasterization produced no image"))?;

        let output = Command::new("tesseract")
            .arg(&raster)
            .arg("stdout")
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .map_err(|e| Self::ocr_error(page, format!("tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::ocr_error(
                page,
                format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
