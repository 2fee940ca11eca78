//! Input-format normalization: word-processor documents to paged PDF
//!
//! Non-PDF inputs are handed to a [`DocumentConverter`] before extraction.
//! The default implementation drives a headless LibreOffice; the converted
//! file lands alongside the original as `<stem>_converted.pdf`.

use crate::DocError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Coarse input classification by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Directly consumable by the extraction stage.
    Pdf,
    /// Needs conversion to PDF first.
    WordProcessor,
    Unsupported,
}

/// Classify an input path by extension (case-insensitive).
pub fn input_format(path: &Path) -> InputFormat {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => InputFormat::Pdf,
        Some("docx") | Some("doc") | Some("odt") | Some("rtf") => InputFormat::WordProcessor,
        _ => InputFormat::Unsupported,
    }
}

/// Converts a word-processor document into a paged PDF next to the original.
pub trait DocumentConverter {
    fn to_pdf(&self, input: &Path) -> Result<PathBuf, DocError>;
}

/// Headless LibreOffice converter (`soffice --headless --convert-to pdf`).
pub struct SofficeConverter {
    pub binary: String,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self {
            binary: "soffice".to_string(),
        }
    }
}

impl DocumentConverter for SofficeConverter {
    fn to_pdf(&self, input: &Path) -> Result<PathBuf, DocError> {
        let out_dir = input.parent().unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .ok_or_else(|| DocError::Conversion(format!("no file stem: {}", input.display())))?
            .to_string_lossy()
            .to_string();

        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .output()
            .map_err(|e| DocError::Conversion(format!("{}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocError::Conversion(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        // soffice names the output after the input stem
        let produced = out_dir.join(format!("{}.pdf", stem));
        if !produced.exists() {
            return Err(DocError::Conversion(
                "converter produced no output".to_string(),
            ));
        }

        let converted = out_dir.join(format!("{}_converted.pdf", stem));
        std::fs::rename(&produced, &converted)
            .map_err(|e| DocError::Conversion(format!("renaming converter output: {}", e)))?;

        Ok(converted)
    }
}
