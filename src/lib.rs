//! Document-to-text transcription with per-page strategy selection
//!
//! This crate provides:
//! - Page classification (image-bearing vs text-bearing) using lopdf
//! - Text-layer extraction via a single whole-document pass
//! - OCR and table-aware extraction behind narrow, injectable interfaces
//! - An orchestrator that assembles an ordered, page-marked transcript

pub mod classifier;
pub mod convert;
pub mod observer;
pub mod ocr;
pub mod pipeline;
pub mod tables;
pub mod text_layer;

pub use convert::{input_format, DocumentConverter, InputFormat, SofficeConverter};
pub use observer::{ExtractionEvent, ExtractionObserver, LogObserver};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pipeline::{
    ExtractionMode, ExtractionStrategy, PageResult, Pipeline, ProcessOptions, ProcessOutcome,
    RunStatus, SourceDocument,
};
pub use tables::{GridTableDetector, TableDetector, TableGrid};
pub use text_layer::TextLayerMap;

use std::path::Path;

/// Process a document with the default collaborators (LibreOffice conversion,
/// Tesseract OCR, grid-based table detection, log-backed observer).
///
/// The returned outcome always carries the transcript string; a failed run
/// yields an empty transcript with the failure reason in `status`.
pub fn process_document<P: AsRef<Path>>(path: P, options: &ProcessOptions) -> ProcessOutcome {
    Pipeline::new().process(path, options)
}

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Format normalization failed. Fatal to the run.
    #[error("format conversion failed: {0}")]
    Conversion(String),
    /// The document could not be opened or parsed. Fatal to the run.
    #[error("cannot open document: {0}")]
    DocumentOpen(String),
    /// Input is neither a PDF nor a convertible word-processor format.
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    /// OCR failed for one page. Recoverable: the page degrades to an
    /// empty fragment and the run continues.
    #[error("OCR failed on page {page}: {reason}")]
    Ocr { page: u32, reason: String },
    /// A single page's extractor failed. Recoverable like `Ocr`.
    #[error("extraction failed on page {page}: {reason}")]
    PageExtraction { page: u32, reason: String },
    /// Writing the transcript to disk failed. The in-memory transcript is
    /// still returned to the caller.
    #[error("failed to persist transcript: {0}")]
    Persistence(String),
}

impl From<lopdf::Error> for DocError {
    fn from(e: lopdf::Error) -> Self {
        DocError::DocumentOpen(e.to_string())
    }
}
