use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::output::{
    report_tables, JsonlRecordSink, MetadataRecord, RecordSink, ReportSink, ReportTable,
    SpecRecord, TocRecord, XlsxReportSink,
};
use crate::providers::{open_provider, PageTextProvider};
use crate::rules::{
    ConsistencyValidator, DiscrepancyReport, HierarchyBuilder, LineMatcher, PageClassifier,
    SectionSpanner, TagGenerator, TitleExtractor,
};
use crate::types::*;
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            info!(
                "{:.<35} {}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        info!("{:.<35} {}ms", "Total", total.as_millis());
    }
}

/// Everything one pipeline run derived from a document.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub doc_title: String,
    /// 0-based page indices judged to hold outline text
    pub candidate_pages: Vec<usize>,
    /// Ordered, tagged, parent-linked outline
    pub entries: Vec<OutlineEntry>,
    pub sections: Vec<Section>,
    pub metadata: DocumentMetadata,
    pub report: DiscrepancyReport,
    pub warnings: Vec<StageWarning>,
}

impl ProcessingOutcome {
    pub fn toc_records(&self) -> Vec<TocRecord> {
        self.entries
            .iter()
            .map(|e| TocRecord::from_entry(&self.doc_title, e))
            .collect()
    }

    pub fn spec_records(&self) -> Vec<SpecRecord> {
        self.sections
            .iter()
            .map(|s| SpecRecord::from_section(&self.doc_title, s))
            .collect()
    }

    pub fn metadata_record(&self) -> MetadataRecord {
        MetadataRecord::from(&self.metadata)
    }

    pub fn report_tables(&self) -> Vec<ReportTable> {
        report_tables(&self.metadata, &self.entries, &self.sections, &self.report)
    }
}

/// Result of a run that also wrote its output.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: ProcessingOutcome,
    pub files: Vec<PathBuf>,
    pub records_written: usize,
    pub records_rejected: usize,
    /// Schema findings from the record sink
    pub sink_warnings: Vec<StageWarning>,
    pub timings: Vec<(String, Duration)>,
}

impl RunSummary {
    pub fn is_valid(&self) -> bool {
        self.outcome.report.is_valid
    }
}

/// Provider, source, and sinks bound by `new_with_dependencies`.
struct BoundIo {
    provider: Box<dyn PageTextProvider>,
    source: DocumentSource,
    records: Box<dyn RecordSink>,
    reports: Option<Box<dyn ReportSink>>,
}

pub struct DocumentProcessor {
    title_extractor: TitleExtractor,
    classifier: PageClassifier,
    matcher: LineMatcher,
    tagger: TagGenerator,
    hierarchy: HierarchyBuilder,
    spanner: SectionSpanner,
    validator: ConsistencyValidator,
    profiling: bool,
    io: Option<BoundIo>,
}

impl DocumentProcessor {
    /// Compile the configured patterns. Fails only on an invalid regex.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            title_extractor: TitleExtractor::new(&config.document),
            classifier: PageClassifier::new(&config.classifier),
            matcher: LineMatcher::new(&config.matcher)?,
            tagger: TagGenerator::new(&config.tagging),
            hierarchy: HierarchyBuilder::new(),
            spanner: SectionSpanner::new(&config.spanner)?,
            validator: ConsistencyValidator::new(&config.validation),
            profiling: false,
            io: None,
        })
    }

    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(
        provider: Box<dyn PageTextProvider>,
        source: DocumentSource,
        records: Box<dyn RecordSink>,
        reports: Option<Box<dyn ReportSink>>,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        let mut processor = Self::new(config)?;
        processor.io = Some(BoundIo {
            provider,
            source,
            records,
            reports,
        });
        Ok(processor)
    }

    /// Convenience constructor for CLI usage: provider picked by extension,
    /// JSONL files and the xlsx report written into `output_dir`.
    pub fn for_files(
        input: &Path,
        output_dir: &Path,
        config: &ExtractionConfig,
    ) -> anyhow::Result<Self> {
        let source = DocumentSource::from_path(input)?;
        let provider = open_provider(input)?;
        let records = JsonlRecordSink::new(output_dir, &config.output, config.validation.strict_mode)?;
        let reports: Option<Box<dyn ReportSink>> = if config.output.generate_validation_report {
            Some(Box::new(XlsxReportSink::new(
                &output_dir.join(&config.output.report_file),
            )))
        } else {
            None
        };

        info!(input = %input.display(), provider = provider.name(), pages = provider.page_count(), "opened source");
        Ok(Self::new_with_dependencies(
            provider,
            source,
            Box::new(records),
            reports,
            config,
        )?)
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    /// Run every stage over `provider`. Stage failures are contained and
    /// reported as warnings; nothing here is fatal.
    pub fn process<P: PageTextProvider + ?Sized>(
        &self,
        provider: &P,
        source: &DocumentSource,
    ) -> ProcessingOutcome {
        self.process_with_profiler(provider, source, &mut StepProfiler::new(false))
    }

    pub fn process_with_profiler<P: PageTextProvider + ?Sized>(
        &self,
        provider: &P,
        source: &DocumentSource,
        profiler: &mut StepProfiler,
    ) -> ProcessingOutcome {
        let mut warnings = Vec::new();

        let doc_title = profiler
            .time_step("1. Title Extraction", || self.title_extractor.extract(provider))
            .into_parts(&mut warnings);
        info!(title = %doc_title, pages = provider.page_count(), "processing document");

        let candidate_pages = profiler
            .time_step("2. Page Classification", || self.classifier.classify(provider))
            .into_parts(&mut warnings);
        info!(candidates = ?candidate_pages, "outline candidate pages");

        let raw_entries = profiler
            .time_step("3. Line Matching", || self.match_lines(provider, &candidate_pages))
            .into_parts(&mut warnings);

        let entries = profiler
            .time_step("4. Tagging + Hierarchy", || {
                let tagged = raw_entries
                    .into_iter()
                    .map(|mut entry| {
                        entry.tags = self.tagger.tags_for(&entry.title);
                        entry
                    })
                    .collect();
                self.hierarchy.build(tagged)
            })
            .into_parts(&mut warnings);
        info!(entries = entries.len(), "outline built");

        let sections = profiler
            .time_step("5. Section Spanning", || self.spanner.span(&entries, provider))
            .into_parts(&mut warnings);

        let report = profiler.time_step("6. Consistency Validation", || {
            self.validator.report(&entries, &sections)
        });
        if !report.is_valid {
            warn!(messages = report.messages.len(), "outline and sections disagree");
        }

        let metadata = DocumentMetadata::from_sections(
            &doc_title,
            provider.page_count(),
            &sections,
            source.size_bytes,
            warnings.iter().map(ToString::to_string).collect(),
        );

        ProcessingOutcome {
            doc_title,
            candidate_pages,
            entries,
            sections,
            metadata,
            report,
            warnings,
        }
    }

    /// Process, then hand the records and report tables to the sinks.
    pub fn process_to_sinks<P: PageTextProvider + ?Sized>(
        &self,
        provider: &P,
        source: &DocumentSource,
        records: &mut dyn RecordSink,
        reports: Option<&mut dyn ReportSink>,
    ) -> anyhow::Result<RunSummary> {
        let mut profiler = StepProfiler::new(self.profiling);
        let outcome = self.process_with_profiler(provider, source, &mut profiler);

        let (sink_report, report_file) = profiler.time_step("7. Output", || {
            write_outputs(&outcome, records, reports)
        })?;
        profiler.log_summary();

        let mut files = sink_report.files;
        files.extend(report_file);

        Ok(RunSummary {
            outcome,
            files,
            records_written: sink_report.records_written,
            records_rejected: sink_report.records_rejected,
            sink_warnings: sink_report.warnings,
            timings: profiler.timings().to_vec(),
        })
    }

    /// Run against the dependencies bound by `new_with_dependencies`.
    pub fn run(&mut self) -> anyhow::Result<RunSummary> {
        let mut io = self
            .io
            .take()
            .ok_or_else(|| anyhow!("no provider or sinks bound; use new_with_dependencies"))?;

        let reports: Option<&mut dyn ReportSink> = match io.reports.as_mut() {
            Some(sink) => Some(sink.as_mut()),
            None => None,
        };
        let result =
            self.process_to_sinks(io.provider.as_ref(), &io.source, io.records.as_mut(), reports);
        self.io = Some(io);
        result.with_context(|| format!("Processing {} failed", self.source_name()))
    }

    fn source_name(&self) -> String {
        self.io
            .as_ref()
            .map(|io| io.source.path.display().to_string())
            .unwrap_or_default()
    }

    fn match_lines<P: PageTextProvider + ?Sized>(
        &self,
        provider: &P,
        candidate_pages: &[usize],
    ) -> StageOutput<Vec<OutlineEntry>> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();

        for &index in candidate_pages {
            let text = match provider.text(index) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = index + 1, error = %e, "skipping unreadable candidate page");
                    warnings.push(StageWarning::ProviderFailure {
                        stage: PipelineStage::LineMatching,
                        page_index: index,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let page = u32::try_from(index + 1).unwrap_or(u32::MAX);
            entries.extend(
                text.lines()
                    .filter_map(|line| self.matcher.match_line(line, page)),
            );
        }

        if entries.is_empty() && !candidate_pages.is_empty() {
            warn!(candidate_pages = candidate_pages.len(), "no outline lines matched");
            warnings.push(StageWarning::NoMatchedLines {
                candidate_pages: candidate_pages.len(),
            });
        }

        debug!(entries = entries.len(), "raw outline entries matched");
        StageOutput::with_warnings(entries, warnings)
    }
}

fn write_outputs(
    outcome: &ProcessingOutcome,
    records: &mut dyn RecordSink,
    reports: Option<&mut dyn ReportSink>,
) -> anyhow::Result<(crate::output::SinkReport, Option<PathBuf>)> {
    records.write_toc(&outcome.toc_records())?;
    records.write_sections(&outcome.spec_records())?;
    records.write_metadata(&outcome.metadata_record())?;
    let sink_report = records.finish()?;

    let report_file = match reports {
        Some(sink) => sink.write_tables(&outcome.report_tables())?,
        None => None,
    };

    Ok((sink_report, report_file))
}
