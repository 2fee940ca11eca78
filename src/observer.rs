//! Structured extraction events
//!
//! The orchestrator reports progress through an injectable observer instead
//! of printing, so callers and tests can assert on what happened without
//! parsing output.

use crate::pipeline::ExtractionStrategy;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    ConversionStarted { input: PathBuf },
    ConversionFinished { output: PathBuf },
    PageClassified { page: u32, image_bearing: bool },
    StrategyChosen { page: u32, strategy: ExtractionStrategy },
    PageExtracted { page: u32, strategy: ExtractionStrategy, chars: usize },
    PageFailed { page: u32, reason: String },
    TranscriptPersisted { path: PathBuf },
    PersistFailed { reason: String },
}

pub trait ExtractionObserver {
    fn on_event(&self, event: &ExtractionEvent);
}

/// Default observer: forwards events through the `log` crate.
pub struct LogObserver;

impl ExtractionObserver for LogObserver {
    fn on_event(&self, event: &ExtractionEvent) {
        match event {
            ExtractionEvent::ConversionStarted { input } => {
                log::info!("converting {} to PDF", input.display());
            }
            ExtractionEvent::ConversionFinished { output } => {
                log::info!("conversion finished: {}", output.display());
            }
            ExtractionEvent::PageClassified {
                page,
                image_bearing,
            } => {
                log::debug!(
                    "page {} classified as {}",
                    page,
                    if *image_bearing { "image-bearing" } else { "text-bearing" }
                );
            }
            ExtractionEvent::StrategyChosen { page, strategy } => {
                log::debug!("page {}: using {:?} extraction", page, strategy);
            }
            ExtractionEvent::PageExtracted {
                page,
                strategy,
                chars,
            } => {
                log::info!("page {} extracted via {:?} ({} chars)", page, strategy, chars);
            }
            ExtractionEvent::PageFailed { page, reason } => {
                log::warn!("page {} failed, degrading to empty fragment: {}", page, reason);
            }
            ExtractionEvent::TranscriptPersisted { path } => {
                log::info!("transcript saved to {}", path.display());
            }
            ExtractionEvent::PersistFailed { reason } => {
                log::warn!("could not save transcript: {}", reason);
            }
        }
    }
}
