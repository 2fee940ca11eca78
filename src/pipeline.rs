//! Extraction orchestration: strategy selection and transcript assembly
//!
//! The pipeline normalizes the input to a paged PDF, then either walks pages
//! in order (classify, dispatch to text layer or OCR) or runs table-aware
//! extraction over the whole document, and concatenates the page results
//! into a transcript with `--- Page N ---` markers.

use crate::classifier;
use crate::convert::{self, DocumentConverter, InputFormat, SofficeConverter};
use crate::observer::{ExtractionEvent, ExtractionObserver, LogObserver};
use crate::ocr::{self, OcrEngine, TesseractOcr};
use crate::tables::{GridTableDetector, TableDetector, TableGrid};
use crate::text_layer::TextLayerMap;
use crate::DocError;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How pages are dispatched for a run. Fixed for the whole run; table-aware
/// mode supersedes per-page classification entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    PerPage,
    TableAware,
}

/// The strategy applied to one page at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    TextLayer,
    Ocr,
    TableAware,
}

/// Options for one processing run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub mode: ExtractionMode,
    /// Write the transcript to disk when the run completes with content.
    pub persist: bool,
    /// Explicit output path; defaults to
    /// `<original-base-name>_extracted_text.txt` next to the original.
    pub output_path: Option<PathBuf>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::PerPage,
            persist: true,
            output_path: None,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunStatus {
    Completed,
    Failed(DocError),
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed(_))
    }
}

/// Result of one processing run. A failed run carries an empty transcript
/// and the failure reason; the entry operation never panics or returns Err.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub transcript: String,
    pub status: RunStatus,
    pub page_count: u32,
    /// Where the transcript was written, when persistence was requested and
    /// succeeded.
    pub output_path: Option<PathBuf>,
    pub processing_time_ms: u64,
}

/// The document being processed. `active_path` is swapped exactly once when
/// format conversion replaces the on-disk representation.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub original_path: PathBuf,
    pub active_path: PathBuf,
}

/// Extraction result for one page: prose first, table fragments after.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub page: u32,
    pub text: String,
    pub tables: Vec<TableGrid>,
}

/// The extraction orchestrator. Collaborators are injectable; `new` wires up
/// the defaults (LibreOffice conversion, Tesseract OCR, grid table
/// detection, log-backed observer).
pub struct Pipeline {
    converter: Box<dyn DocumentConverter>,
    ocr: Box<dyn OcrEngine>,
    tables: Box<dyn TableDetector>,
    observer: Box<dyn ExtractionObserver>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            converter: Box::new(SofficeConverter::default()),
            ocr: Box::new(TesseractOcr::default()),
            tables: Box::new(GridTableDetector::default()),
            observer: Box::new(LogObserver),
        }
    }

    pub fn with_converter(mut self, converter: Box<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_table_detector(mut self, tables: Box<dyn TableDetector>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run the pipeline on one input document.
    ///
    /// Fatal conditions (conversion failure, unreadable document,
    /// unsupported format) yield `RunStatus::Failed` with an empty
    /// transcript. Per-page failures degrade that page to an empty fragment
    /// and the run still completes.
    pub fn process<P: AsRef<Path>>(&self, input: P, options: &ProcessOptions) -> ProcessOutcome {
        let start = Instant::now();
        match self.run(input.as_ref(), options) {
            Ok((transcript, page_count, output_path)) => ProcessOutcome {
                transcript,
                status: RunStatus::Completed,
                page_count,
                output_path,
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => {
                log::error!("extraction failed: {}", e);
                ProcessOutcome {
                    transcript: String::new(),
                    status: RunStatus::Failed(e),
                    page_count: 0,
                    output_path: None,
                    processing_time_ms: start.elapsed().as_millis() as u64,
                }
            }
        }
    }

    fn run(
        &self,
        input: &Path,
        options: &ProcessOptions,
    ) -> Result<(String, u32, Option<PathBuf>), DocError> {
        let document = self.normalize(input)?;
        let doc = Document::load(&document.active_path)
            .map_err(|e| DocError::DocumentOpen(e.to_string()))?;

        let results = match options.mode {
            ExtractionMode::PerPage => self.extract_per_page(&doc, &document),
            ExtractionMode::TableAware => self.extract_table_aware(&doc),
        };

        let page_count = results.len() as u32;
        let transcript = assemble_transcript(results);

        let output_path = if options.persist && !transcript.is_empty() {
            self.persist(&document, &transcript, options.output_path.as_deref())
        } else {
            None
        };

        Ok((transcript, page_count, output_path))
    }

    /// Normalize the input to a paged PDF, converting when needed.
    fn normalize(&self, input: &Path) -> Result<SourceDocument, DocError> {
        match convert::input_format(input) {
            InputFormat::Pdf => Ok(SourceDocument {
                original_path: input.to_path_buf(),
                active_path: input.to_path_buf(),
            }),
            InputFormat::WordProcessor => {
                self.observer.on_event(&ExtractionEvent::ConversionStarted {
                    input: input.to_path_buf(),
                });
                let converted = self.converter.to_pdf(input)?;
                self.observer.on_event(&ExtractionEvent::ConversionFinished {
                    output: converted.clone(),
                });
                Ok(SourceDocument {
                    original_path: input.to_path_buf(),
                    active_path: converted,
                })
            }
            InputFormat::Unsupported => {
                Err(DocError::UnsupportedFormat(input.display().to_string()))
            }
        }
    }

    /// Per-page mode: classify each page and dispatch to OCR or the text
    /// layer. Pages are walked strictly in ascending order; a failed page
    /// degrades to an empty fragment and the loop continues.
    fn extract_per_page(&self, doc: &Document, document: &SourceDocument) -> Vec<PageResult> {
        let text_layer = TextLayerMap::load(doc);
        let mut results = Vec::new();

        for (&page, &page_id) in doc.get_pages().iter() {
            let image_bearing = classifier::page_has_images(doc, page_id);
            self.observer.on_event(&ExtractionEvent::PageClassified {
                page,
                image_bearing,
            });

            let strategy = if image_bearing {
                ExtractionStrategy::Ocr
            } else {
                ExtractionStrategy::TextLayer
            };
            self.observer
                .on_event(&ExtractionEvent::StrategyChosen { page, strategy });

            let text = match strategy {
                ExtractionStrategy::Ocr => {
                    match ocr::extract_page_ocr(self.ocr.as_ref(), &document.active_path, page) {
                        Ok(text) => text,
                        Err(e) => {
                            self.observer.on_event(&ExtractionEvent::PageFailed {
                                page,
                                reason: e.to_string(),
                            });
                            String::new()
                        }
                    }
                }
                _ => text_layer.page_text(page).to_string(),
            };

            self.observer.on_event(&ExtractionEvent::PageExtracted {
                page,
                strategy,
                chars: text.len(),
            });
            results.push(PageResult {
                page,
                text,
                tables: Vec::new(),
            });
        }

        results
    }

    /// Table-aware mode: one pass over the whole document, prose plus
    /// linearized tables per page. A page-level detection failure degrades
    /// that page's table block to empty.
    fn extract_table_aware(&self, doc: &Document) -> Vec<PageResult> {
        let text_layer = TextLayerMap::load(doc);
        let mut results = Vec::new();

        for (&page, &page_id) in doc.get_pages().iter() {
            self.observer.on_event(&ExtractionEvent::StrategyChosen {
                page,
                strategy: ExtractionStrategy::TableAware,
            });

            let text = text_layer.page_text(page).to_string();
            let tables = match self.tables.detect_tables(doc, page_id, page) {
                Ok(tables) => tables,
                Err(e) => {
                    self.observer.on_event(&ExtractionEvent::PageFailed {
                        page,
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            };

            self.observer.on_event(&ExtractionEvent::PageExtracted {
                page,
                strategy: ExtractionStrategy::TableAware,
                chars: text.len(),
            });
            results.push(PageResult { page, text, tables });
        }

        results
    }

    /// Write the transcript next to the original document. Failure is
    /// reported through the observer and the log; the in-memory transcript
    /// is unaffected.
    fn persist(
        &self,
        document: &SourceDocument,
        transcript: &str,
        explicit: Option<&Path>,
    ) -> Option<PathBuf> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => default_output_path(&document.original_path),
        };

        match std::fs::write(&path, transcript) {
            Ok(()) => {
                self.observer
                    .on_event(&ExtractionEvent::TranscriptPersisted { path: path.clone() });
                Some(path)
            }
            Err(e) => {
                let err = DocError::Persistence(format!("{}: {}", path.display(), e));
                self.observer.on_event(&ExtractionEvent::PersistFailed {
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

/// Default transcript location: `<original-base-name>_extracted_text.txt`
/// alongside the original document.
pub fn default_output_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{}_extracted_text.txt", stem);
    match original.parent() {
        Some(parent) if parent != Path::new("") => parent.join(name),
        _ => PathBuf::from(name),
    }
}

/// Concatenate page results in ascending page order with boundary markers.
///
/// Results are re-sorted by page index first; ordering is the invariant that
/// must survive any future parallel extraction.
pub fn assemble_transcript(mut results: Vec<PageResult>) -> String {
    results.sort_by_key(|r| r.page);

    let mut out = String::new();
    for result in &results {
        out.push_str(&format!("--- Page {} ---\n", result.page));
        out.push_str(result.text.trim_end());
        out.push('\n');

        for table in &result.tables {
            out.push_str(&format!("\n--- Table Extracted (Page {}) ---\n", result.page));
            out.push_str(&table.render());
            out.push('\n');
        }
    }
    out
}
