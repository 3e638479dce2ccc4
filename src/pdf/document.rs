/*!
 * PDF document handle used by the pipeline.
 */

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use lopdf::{Document, ObjectId};

use super::extract::extract_page_runs;
use super::fonts::OverlayFont;
use super::model::PageRuns;
use super::overlay::{apply_page, FontObjects, OverlayStats};
use crate::app_config::OverlayConfig;
use crate::errors::PdfError;

/// An opened PDF
pub struct PdfDocument {
    inner: Document,
    // @field: page object ids by 0-based index
    pages: Vec<ObjectId>,
}

impl PdfDocument {
    /// Load a document from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let inner = Document::load(path).map_err(|e| PdfError::Load(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_document(inner))
    }

    /// Wrap an in-memory document
    pub fn from_document(inner: Document) -> Self {
        let pages: BTreeMap<u32, ObjectId> = inner.get_pages();
        let pages = pages.into_values().collect();
        Self { inner, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, PdfError> {
        self.pages
            .get(page_index)
            .copied()
            .ok_or(PdfError::PageOutOfRange(page_index + 1))
    }

    /// Extract the runs of one page
    pub fn extract_page(&self, page_index: usize, min_text_chars: usize) -> Result<PageRuns, PdfError> {
        let page_id = self.page_id(page_index)?;
        let runs = extract_page_runs(&self.inner, page_id, page_index, min_text_chars)?;
        Ok(PageRuns { page_index, runs })
    }

    /// Extract the runs of the given pages, in the given order
    pub fn extract_runs(&self, pages: &[usize], min_text_chars: usize) -> Result<Vec<PageRuns>, PdfError> {
        pages
            .iter()
            .map(|&page_index| self.extract_page(page_index, min_text_chars))
            .collect()
    }

    /// Redact and rewrite one page
    pub fn apply_page(
        &mut self,
        page: &PageRuns,
        chain: &[OverlayFont],
        config: &OverlayConfig,
        font_objects: &mut FontObjects,
    ) -> Result<OverlayStats, PdfError> {
        let page_id = self.page_id(page.page_index)?;
        apply_page(&mut self.inner, page_id, page, chain, config, font_objects)
    }

    /// Redact and rewrite every page of the list
    pub fn apply_translations(
        &mut self,
        pages: &[PageRuns],
        chain: &[OverlayFont],
        config: &OverlayConfig,
    ) -> Result<OverlayStats, PdfError> {
        let mut font_objects = FontObjects::new();
        let mut stats = OverlayStats::default();
        for page in pages {
            stats.merge(self.apply_page(page, chain, config, &mut font_objects)?);
        }
        Ok(stats)
    }

    /// Write the document to disk
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PdfError> {
        let path = path.as_ref();
        self.inner
            .save(path)
            .map_err(|e| PdfError::Save(format!("{}: {}", path.display(), e)))?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}
