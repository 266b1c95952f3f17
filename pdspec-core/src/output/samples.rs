//! Sample output generated from a small built-in document.

use super::jsonl::JsonlRecordSink;
use crate::config::ExtractionConfig;
use crate::processor::{DocumentProcessor, RunSummary};
use crate::providers::InMemoryProvider;
use crate::types::DocumentSource;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

const SAMPLE_PAGES: [&str; 5] = [
    "USB Power Delivery Specification Rev X\nRevision 3.2, Version 1.0",
    "Table of Contents\n\
     2 Overview 3\n\
     2.1 Introduction 3\n\
     2.1.1 Power Delivery Source Operational Contracts 4\n\
     2.2 Cable Plug Communication 5",
    "This chapter describes how power is negotiated between port partners.\n\
     See Figure 2 for the message flow.",
    "Table 1 Fixed supply capabilities\n\
     A source advertises its capabilities to the sink.",
    "Cable plugs respond to SOP' packets.\nEnd of sample.",
];

/// The built-in sample document.
pub fn sample_document() -> InMemoryProvider {
    InMemoryProvider::new(SAMPLE_PAGES.to_vec())
}

/// Run the pipeline over the sample document and write its JSONL records into
/// `<output_dir>/<samples_dir>`. Returns the samples directory.
pub fn generate_samples(output_dir: &Path, config: &ExtractionConfig) -> Result<PathBuf> {
    let samples_dir = output_dir.join(&config.output.samples_dir);
    let provider = sample_document();
    let source = DocumentSource::in_memory("sample", provider.size_bytes());

    let processor = DocumentProcessor::new(config)?;
    let mut sink = JsonlRecordSink::new(&samples_dir, &config.output, false)?;
    let summary: RunSummary = processor.process_to_sinks(&provider, &source, &mut sink, None)?;

    info!(
        dir = %samples_dir.display(),
        records = summary.records_written,
        "generated sample output"
    );
    Ok(samples_dir)
}
