//! PDF text extraction using lopdf.
//!
//! Text is extracted lazily per page. lopdf exposes no table structure, so
//! table presence uses the same caption heuristic as plain text.

use super::{check_index, has_table_caption, PageTextProvider};
use crate::error::{ExtractionError, Result};
use lopdf::Document;
use std::path::Path;
use tracing::debug;

pub struct PdfProvider {
    doc: Document,
    /// lopdf page numbers (1-based) in document order
    page_numbers: Vec<u32>,
}

impl PdfProvider {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path).map_err(|e| ExtractionError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(doc))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(data).map_err(|e| ExtractionError::SourceUnreadable {
            path: "<memory>".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: Document) -> Self {
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!(pages = page_numbers.len(), "loaded pdf source");
        Self { doc, page_numbers }
    }
}

impl PageTextProvider for PdfProvider {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn text(&self, index: usize) -> Result<String> {
        check_index(index, self.page_numbers.len())?;
        self.doc
            .extract_text(&[self.page_numbers[index]])
            .map_err(|e| ExtractionError::PageText {
                page: index,
                reason: e.to_string(),
            })
    }

    fn has_tables(&self, index: usize) -> Result<bool> {
        Ok(has_table_caption(&self.text(index)?))
    }

    fn name(&self) -> &str {
        "lopdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        assert!(matches!(
            PdfProvider::from_bytes(b"definitely not a pdf"),
            Err(ExtractionError::SourceUnreadable { .. })
        ));
    }
}
