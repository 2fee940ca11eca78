//! Text-layer extraction via a single whole-document pass
//!
//! Text for every page is pulled once at load time into a page-indexed map,
//! so per-page lookups during orchestration are O(1) instead of re-parsing
//! the document for each page.

use lopdf::Document;
use std::collections::BTreeMap;

/// Page-indexed snapshot of a document's native text layer.
#[derive(Debug, Clone, Default)]
pub struct TextLayerMap {
    pages: BTreeMap<u32, String>,
}

impl TextLayerMap {
    /// Build the map from an already-opened document.
    ///
    /// A page without an extractable text layer maps to the empty string;
    /// that is not an error. Per-page decode failures also degrade to empty.
    pub fn load(doc: &Document) -> Self {
        let mut pages = BTreeMap::new();
        for &page_num in doc.get_pages().keys() {
            let text = doc.extract_text(&[page_num]).unwrap_or_default();
            pages.insert(page_num, text);
        }
        Self { pages }
    }

    /// Text for a 1-based page number; empty string when the page has no
    /// text layer or the page number is unknown.
    pub fn page_text(&self, page: u32) -> &str {
        self.pages.get(&page).map(String::as_str).unwrap_or("")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
