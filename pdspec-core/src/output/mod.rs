//! Output boundary: record sinks (JSON Lines), report sinks (xlsx workbook),
//! the record schema contract, and sample files.

pub mod jsonl;
pub mod records;
pub mod report;
pub mod samples;
pub mod schema;
pub mod xlsx;

pub use jsonl::JsonlRecordSink;
pub use records::{MetadataRecord, SpecRecord, TocRecord};
pub use report::{report_tables, Cell, ReportTable};
pub use samples::generate_samples;
pub use schema::{validate_outputs, validate_outputs_with, OutputValidation, RecordKind, RecordSchema};
pub use xlsx::XlsxReportSink;

use crate::types::StageWarning;
use anyhow::Result;
use std::path::PathBuf;

/// Receives the three record streams of one run.
pub trait RecordSink {
    fn write_toc(&mut self, records: &[TocRecord]) -> Result<()>;
    fn write_sections(&mut self, records: &[SpecRecord]) -> Result<()>;
    fn write_metadata(&mut self, record: &MetadataRecord) -> Result<()>;

    /// Flush everything and report what was written.
    fn finish(&mut self) -> Result<SinkReport>;
}

/// Receives the tabular validation report.
pub trait ReportSink {
    /// Returns the path written, if the sink writes a file.
    fn write_tables(&mut self, tables: &[ReportTable]) -> Result<Option<PathBuf>>;
}

/// What a record sink did with the records it was given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub files: Vec<PathBuf>,
    pub records_written: usize,
    pub records_rejected: usize,
    pub warnings: Vec<StageWarning>,
}

/// Keeps everything in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub toc: Vec<TocRecord>,
    pub sections: Vec<SpecRecord>,
    pub metadata: Option<MetadataRecord>,
    pub tables: Vec<ReportTable>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn write_toc(&mut self, records: &[TocRecord]) -> Result<()> {
        self.toc.extend_from_slice(records);
        Ok(())
    }

    fn write_sections(&mut self, records: &[SpecRecord]) -> Result<()> {
        self.sections.extend_from_slice(records);
        Ok(())
    }

    fn write_metadata(&mut self, record: &MetadataRecord) -> Result<()> {
        self.metadata = Some(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<SinkReport> {
        let records_written =
            self.toc.len() + self.sections.len() + usize::from(self.metadata.is_some());
        Ok(SinkReport {
            records_written,
            ..SinkReport::default()
        })
    }
}

impl ReportSink for MemorySink {
    fn write_tables(&mut self, tables: &[ReportTable]) -> Result<Option<PathBuf>> {
        self.tables = tables.to_vec();
        Ok(None)
    }
}
