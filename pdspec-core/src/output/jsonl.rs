use super::records::{MetadataRecord, SpecRecord, TocRecord};
use super::schema::{RecordKind, RecordSchema};
use super::{RecordSink, SinkReport};
use crate::config::OutputConfig;
use crate::types::StageWarning;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes one compact JSON object per line into three files in `output_dir`.
///
/// Every record is checked against its schema first. Non-strict mode writes
/// violating records anyway and records a warning; strict mode drops them.
pub struct JsonlRecordSink {
    output_dir: PathBuf,
    config: OutputConfig,
    strict: bool,
    report: SinkReport,
}

impl JsonlRecordSink {
    pub fn new(output_dir: &Path, config: &OutputConfig, strict: bool) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            config: config.clone(),
            strict,
            report: SinkReport::default(),
        })
    }

    fn write_records<T: Serialize>(
        &mut self,
        file_name: &str,
        kind: RecordKind,
        records: &[T],
        key_of: impl Fn(&T) -> String,
    ) -> Result<()> {
        let path = self.output_dir.join(file_name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let schema = RecordSchema::for_kind(kind);

        let mut written = 0;
        for record in records {
            let value = serde_json::to_value(record)?;
            let violations = schema.violations(&value);

            if !violations.is_empty() {
                let key = key_of(record);
                warn!(kind = %kind, key = %key, strict = self.strict, "schema validation failed");
                self.report.warnings.push(StageWarning::SchemaViolation {
                    record_kind: kind.to_string(),
                    key,
                    detail: violations.join("; "),
                    rejected: self.strict,
                });
                if self.strict {
                    self.report.records_rejected += 1;
                    continue;
                }
            }

            serde_json::to_writer(&mut writer, &value)?;
            writer.write_all(b"\n")?;
            written += 1;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), records = written, "wrote {} records", kind);

        self.report.records_written += written;
        self.report.files.push(path);
        Ok(())
    }
}

impl RecordSink for JsonlRecordSink {
    fn write_toc(&mut self, records: &[TocRecord]) -> Result<()> {
        let file_name = self.config.toc_file.clone();
        self.write_records(&file_name, RecordKind::Toc, records, |r| r.section_id.clone())
    }

    fn write_sections(&mut self, records: &[SpecRecord]) -> Result<()> {
        let file_name = self.config.spec_file.clone();
        self.write_records(&file_name, RecordKind::Section, records, |r| {
            r.section_id.clone()
        })
    }

    fn write_metadata(&mut self, record: &MetadataRecord) -> Result<()> {
        let file_name = self.config.metadata_file.clone();
        self.write_records(
            &file_name,
            RecordKind::Metadata,
            std::slice::from_ref(record),
            |r| r.doc_title.clone(),
        )
    }

    fn finish(&mut self) -> Result<SinkReport> {
        Ok(std::mem::take(&mut self.report))
    }
}
