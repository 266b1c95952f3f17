// pdspec Core Library
//
// Extracts the outline of a specification-style document from per-page text,
// expands it into sections, and cross-checks the two.
// Main interface is DocumentProcessor over a PageTextProvider.

pub mod config;
pub mod error;
pub mod output;
pub mod processor;
pub mod providers;
pub mod rules;
pub mod types;

// Re-export main types and functions for easy use
pub use config::ExtractionConfig;
pub use error::{ExtractionError, Result};
pub use output::{
    generate_samples, validate_outputs, validate_outputs_with, JsonlRecordSink, MemorySink,
    OutputValidation, RecordSink, ReportSink, XlsxReportSink,
};
pub use processor::{DocumentProcessor, ProcessingOutcome, RunSummary, StepProfiler};
pub use providers::{open_provider, InMemoryProvider, PageTextProvider, PlainTextProvider, XhtmlProvider};
pub use rules::{DiscrepancyReport, ConsistencyValidator};
pub use types::*;

#[cfg(feature = "pdf-backend")]
pub use providers::PdfProvider;
