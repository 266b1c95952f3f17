//! Page Text Providers
//!
//! The pipeline never touches document formats directly. It reads pages through
//! a `PageTextProvider`, one 0-based page index at a time.
//!
//! ```text
//! Document (TXT, XHTML, PDF)
//!     ↓
//! [Format-specific provider]
//!     ↓
//! per-page text + table presence
//!     ↓
//! [Pipeline stages]
//! ```
//!
//! ## Available Providers
//!
//! - `PlainTextProvider` - text files with form-feed (`\x0c`) page breaks
//! - `XhtmlProvider` - Tika-style XHTML with `<div class="page">` blocks
//! - `PdfProvider` - PDF text extraction via lopdf (`pdf-backend` feature)
//! - `InMemoryProvider` - pages held in memory, for tests and samples

pub mod text;
pub mod xhtml;
#[cfg(feature = "pdf-backend")]
pub mod pdf;

pub use text::PlainTextProvider;
pub use xhtml::XhtmlProvider;
#[cfg(feature = "pdf-backend")]
pub use pdf::PdfProvider;

use crate::error::{ExtractionError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TABLE_CAPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Table\s+\d+").unwrap());

/// Read-only, random-access view of a paginated document.
///
/// Indices are 0-based. Implementations must be deterministic: the same index
/// always yields the same text.
pub trait PageTextProvider {
    fn page_count(&self) -> usize;

    /// Extracted text of one page. Lines are separated by `\n`.
    fn text(&self, index: usize) -> Result<String>;

    /// Whether the page contains at least one table.
    fn has_tables(&self, index: usize) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

impl<P: PageTextProvider + ?Sized> PageTextProvider for Box<P> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn text(&self, index: usize) -> Result<String> {
        (**self).text(index)
    }

    fn has_tables(&self, index: usize) -> Result<bool> {
        (**self).has_tables(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// True when a line of the page starts with a table caption such as "Table 6-1".
pub fn has_table_caption(text: &str) -> bool {
    TABLE_CAPTION_REGEX.is_match(text)
}

pub(crate) fn check_index(index: usize, page_count: usize) -> Result<()> {
    if index >= page_count {
        return Err(ExtractionError::PageOutOfRange(index, page_count));
    }
    Ok(())
}

/// Pick a provider from the file extension.
pub fn open_provider(path: &Path) -> Result<Box<dyn PageTextProvider>> {
    if !path.exists() {
        return Err(ExtractionError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "text" => Ok(Box::new(PlainTextProvider::open(path)?)),
        "xhtml" | "html" | "htm" => Ok(Box::new(XhtmlProvider::open(path)?)),
        #[cfg(feature = "pdf-backend")]
        "pdf" => Ok(Box::new(PdfProvider::open(path)?)),
        _ => Err(ExtractionError::UnsupportedSource(path.to_path_buf())),
    }
}

/// Pages held in memory. Table presence is given explicitly per page.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    pages: Vec<String>,
    tables: Vec<bool>,
}

impl InMemoryProvider {
    /// Table presence falls back to the caption heuristic.
    pub fn new<S: Into<String>>(pages: Vec<S>) -> Self {
        let pages: Vec<String> = pages.into_iter().map(Into::into).collect();
        let tables = pages.iter().map(|p| has_table_caption(p)).collect();
        Self { pages, tables }
    }

    pub fn with_tables<S: Into<String>>(pages: Vec<(S, bool)>) -> Self {
        let (pages, tables) = pages.into_iter().map(|(p, t)| (p.into(), t)).unzip();
        Self { pages, tables }
    }

    /// Approximate byte size of the held text
    pub fn size_bytes(&self) -> u64 {
        self.pages.iter().map(|p| p.len() as u64).sum()
    }
}

impl PageTextProvider for InMemoryProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&self, index: usize) -> Result<String> {
        check_index(index, self.pages.len())?;
        Ok(self.pages[index].clone())
    }

    fn has_tables(&self, index: usize) -> Result<bool> {
        check_index(index, self.tables.len())?;
        Ok(self.tables[index])
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
