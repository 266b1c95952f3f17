//! Plain text documents. Pages are separated by form feeds, the way
//! `pdftotext` writes them.

use super::{check_index, has_table_caption, PageTextProvider};
use crate::error::{ExtractionError, Result};
use std::path::Path;
use tracing::debug;

const PAGE_BREAK: char = '\x0c';

pub struct PlainTextProvider {
    pages: Vec<String>,
}

impl PlainTextProvider {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|e| ExtractionError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let provider = Self::from_text(&content);
        debug!(path = %path.display(), pages = provider.pages.len(), "loaded plain text source");
        Ok(provider)
    }

    pub fn from_text(content: &str) -> Self {
        let mut pages: Vec<String> = content
            .split(PAGE_BREAK)
            .map(|page| page.replace("\r\n", "\n"))
            .collect();

        // pdftotext terminates the last page with a form feed too
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }

        Self { pages }
    }
}

impl PageTextProvider for PlainTextProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&self, index: usize) -> Result<String> {
        check_index(index, self.pages.len())?;
        Ok(self.pages[index].clone())
    }

    fn has_tables(&self, index: usize) -> Result<bool> {
        check_index(index, self.pages.len())?;
        Ok(has_table_caption(&self.pages[index]))
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}
