use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{ExtractionError, Result};

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());

/// True when `identifier` is a dotted numeric outline identifier such as "2.1.3".
pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_REGEX.is_match(identifier)
}

/// Outline depth of an identifier: one more than its number of dots.
pub fn level_of(identifier: &str) -> u32 {
    identifier.matches('.').count() as u32 + 1
}

/// Identifier of the enclosing entry ("2.1.3" -> "2.1"), `None` for top-level identifiers.
pub fn parent_identifier(identifier: &str) -> Option<&str> {
    identifier.rsplit_once('.').map(|(parent, _)| parent)
}

// ===== OUTLINE MODEL =====

/// One heading parsed from the document's table of contents.
///
/// Created by the line matcher, tagged by the tag generator, and given its
/// parent by the hierarchy builder. Nothing mutates it after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub identifier: String,
    pub title: String,
    /// 1-based page number the heading points at
    pub page: u32,
    pub level: u32,
    pub parent: Option<String>,
    pub tags: Vec<String>,
}

impl OutlineEntry {
    pub fn new(identifier: &str, title: &str, page: u32) -> Self {
        Self {
            identifier: identifier.to_string(),
            title: title.trim().to_string(),
            page,
            level: level_of(identifier),
            parent: None,
            tags: Vec::new(),
        }
    }

    /// "<identifier> <title>", e.g. "2.1 Introduction"
    pub fn full_path(&self) -> String {
        format!("{} {}", self.identifier, self.title)
    }
}

/// An outline entry expanded with its inferred page span and content statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(flatten)]
    pub entry: OutlineEntry,
    pub content_start: u32,
    /// Last page of the section. `None` for the final section. May be smaller than
    /// `content_start` when the next heading sits on the same page.
    pub content_end: Option<u32>,
    pub has_tables: bool,
    pub has_figures: bool,
    pub word_count: u64,
}

impl Section {
    pub fn identifier(&self) -> &str {
        &self.entry.identifier
    }

    /// True when the next section starts on the same page as this one.
    pub fn is_degenerate(&self) -> bool {
        matches!(self.content_end, Some(end) if end < self.content_start)
    }
}

/// Aggregate information about one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub doc_title: String,
    pub total_pages: usize,
    pub total_sections: usize,
    /// Number of sections containing at least one table
    pub total_tables: usize,
    /// Number of sections containing at least one figure reference
    pub total_figures: usize,
    pub max_level: u32,
    pub generated_at: DateTime<Utc>,
    pub source_size: u64,
    pub errors: Vec<String>,
}

impl DocumentMetadata {
    pub fn from_sections(
        doc_title: &str,
        total_pages: usize,
        sections: &[Section],
        source_size: u64,
        errors: Vec<String>,
    ) -> Self {
        Self {
            doc_title: doc_title.to_string(),
            total_pages,
            total_sections: sections.len(),
            total_tables: sections.iter().filter(|s| s.has_tables).count(),
            total_figures: sections.iter().filter(|s| s.has_figures).count(),
            max_level: sections.iter().map(|s| s.entry.level).max().unwrap_or(1),
            generated_at: Utc::now(),
            source_size,
            errors,
        }
    }
}

// ===== SOURCE =====

/// Where the pages came from. Only the size reaches the output; the path is for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl DocumentSource {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExtractionError::SourceNotFound(path.to_path_buf()));
        }
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
        })
    }

    pub fn in_memory(name: &str, size_bytes: u64) -> Self {
        Self {
            path: PathBuf::from(name),
            size_bytes,
        }
    }
}

// ===== STAGE RESULTS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    TitleExtraction,
    PageClassification,
    LineMatching,
    SectionSpanning,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::TitleExtraction => "title extraction",
            PipelineStage::PageClassification => "page classification",
            PipelineStage::LineMatching => "line matching",
            PipelineStage::SectionSpanning => "section spanning",
        };
        f.write_str(name)
    }
}

/// Non-fatal event raised by a stage. The pipeline keeps going on partial data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageWarning {
    NoCandidatePages {
        searched_pages: usize,
    },
    NoMatchedLines {
        candidate_pages: usize,
    },
    DuplicateIdentifier {
        identifier: String,
        page: u32,
    },
    OrphanedEntry {
        identifier: String,
        parent: String,
    },
    ProviderFailure {
        stage: PipelineStage,
        page_index: usize,
        message: String,
    },
    SchemaViolation {
        record_kind: String,
        key: String,
        detail: String,
        rejected: bool,
    },
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageWarning::NoCandidatePages { searched_pages } => write!(
                f,
                "No outline candidate pages found in the first {searched_pages} pages"
            ),
            StageWarning::NoMatchedLines { candidate_pages } => write!(
                f,
                "No outline lines matched on {candidate_pages} candidate pages"
            ),
            StageWarning::DuplicateIdentifier { identifier, page } => write!(
                f,
                "Duplicate identifier {identifier} (page {page}) rejected; first occurrence kept"
            ),
            StageWarning::OrphanedEntry { identifier, parent } => {
                write!(f, "Parent {parent} not found for {identifier}")
            }
            StageWarning::ProviderFailure {
                stage,
                page_index,
                message,
            } => write!(
                f,
                "Page {} unreadable during {stage}: {message}",
                page_index + 1
            ),
            StageWarning::SchemaViolation {
                record_kind,
                key,
                detail,
                rejected,
            } => {
                let action = if *rejected { "rejected" } else { "written" };
                write!(f, "{record_kind} record {key} {action}: {detail}")
            }
        }
    }
}

/// A stage's payload together with the warnings it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub value: T,
    pub warnings: Vec<StageWarning>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<StageWarning>) -> Self {
        Self { value, warnings }
    }

    /// Move the warnings into `sink` and hand back the payload.
    pub fn into_parts(self, sink: &mut Vec<StageWarning>) -> T {
        sink.extend(self.warnings);
        self.value
    }
}
