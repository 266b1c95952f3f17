//! XHTML Provider
//!
//! Reads the XHTML that Apache Tika emits for PDFs: one `<div class="page">`
//! per page, paragraphs as `<p>` elements, tables as `<table>`.

use super::{check_index, PageTextProvider};
use crate::error::{ExtractionError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

// Pre-compiled regexes for XHTML parsing
static PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="page"[^>]*>(.*?)</div>"#).unwrap());

static PARAGRAPH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").unwrap());

static TABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<table[\s>]").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

struct XhtmlPage {
    text: String,
    has_tables: bool,
}

pub struct XhtmlProvider {
    pages: Vec<XhtmlPage>,
}

impl XhtmlProvider {
    pub fn open(path: &Path) -> Result<Self> {
        let markup = std::fs::read_to_string(path).map_err(|e| ExtractionError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let provider = Self::from_markup(&markup);
        if provider.pages.is_empty() {
            return Err(ExtractionError::SourceUnreadable {
                path: path.to_path_buf(),
                reason: "no <div class=\"page\"> blocks found".to_string(),
            });
        }
        debug!(path = %path.display(), pages = provider.pages.len(), "loaded xhtml source");
        Ok(provider)
    }

    pub fn from_markup(markup: &str) -> Self {
        let pages = PAGE_REGEX
            .captures_iter(markup)
            .map(|cap| {
                let body = &cap[1];
                XhtmlPage {
                    text: page_text(body),
                    has_tables: TABLE_REGEX.is_match(body),
                }
            })
            .collect();
        Self { pages }
    }
}

/// One line per paragraph; markup without paragraphs is stripped as a whole.
fn page_text(body: &str) -> String {
    let paragraphs: Vec<String> = PARAGRAPH_REGEX
        .captures_iter(body)
        .map(|cap| clean_text(&cap[1]))
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        clean_text(body)
    } else {
        paragraphs.join("\n")
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG_REGEX.replace_all(fragment, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl PageTextProvider for XhtmlProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&self, index: usize) -> Result<String> {
        check_index(index, self.pages.len())?;
        Ok(self.pages[index].text.clone())
    }

    fn has_tables(&self, index: usize) -> Result<bool> {
        check_index(index, self.pages.len())?;
        Ok(self.pages[index].has_tables)
    }

    fn name(&self) -> &str {
        "xhtml"
    }
}
