//! Error types for the extraction pipeline.
//!
//! Only input problems are errors. Heuristic misses, schema violations and
//! outline/section discrepancies travel as data (`StageWarning`, `DiscrepancyReport`).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdspec operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The source document does not exist.
    #[error("Source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// No provider knows how to read this kind of file.
    #[error("Unsupported source type: {}", .0.display())]
    UnsupportedSource(PathBuf),

    /// The source exists but could not be opened or decoded.
    #[error("Failed to read source {}: {reason}", .path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// A page index outside the provider's range was requested.
    #[error("Page index {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Text for a single page could not be extracted.
    #[error("Text extraction failed on page index {page}: {reason}")]
    PageText { page: usize, reason: String },

    /// A configured heading or figure pattern is not a valid regex.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
