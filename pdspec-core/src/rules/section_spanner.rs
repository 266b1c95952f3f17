use crate::config::SpannerConfig;
use crate::error::{ExtractionError, Result};
use crate::providers::PageTextProvider;
use crate::types::{OutlineEntry, PipelineStage, Section, StageOutput, StageWarning};
use regex::Regex;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SpanStats {
    has_tables: bool,
    has_figures: bool,
    word_count: u64,
}

// SectionSpanner - expands ordered outline entries into sections with page spans
pub struct SectionSpanner {
    figure_regex: Regex,
}

impl SectionSpanner {
    pub fn new(config: &SpannerConfig) -> Result<Self> {
        let figure_regex =
            Regex::new(&config.figure_pattern).map_err(|e| ExtractionError::InvalidPattern {
                pattern: config.figure_pattern.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { figure_regex })
    }

    /// One section per entry. `entries` must already be in outline order.
    pub fn span<P: PageTextProvider + ?Sized>(
        &self,
        entries: &[OutlineEntry],
        provider: &P,
    ) -> StageOutput<Vec<Section>> {
        let mut warnings = Vec::new();
        let mut sections = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let content_start = entry.page;
            let content_end = entries.get(i + 1).map(|next| next.page.saturating_sub(1));

            // the last section only scans its first page
            let last_page = content_end.unwrap_or(content_start);

            let stats = match self.collect_stats(provider, content_start, last_page) {
                Ok(stats) => stats,
                Err((page_index, e)) => {
                    warn!(
                        section = %entry.identifier,
                        page = page_index + 1,
                        error = %e,
                        "page unreadable, section statistics cleared"
                    );
                    warnings.push(StageWarning::ProviderFailure {
                        stage: PipelineStage::SectionSpanning,
                        page_index,
                        message: e.to_string(),
                    });
                    SpanStats::default()
                }
            };

            sections.push(Section {
                entry: entry.clone(),
                content_start,
                content_end,
                has_tables: stats.has_tables,
                has_figures: stats.has_figures,
                word_count: stats.word_count,
            });
        }

        debug!(sections = sections.len(), "sections spanned");
        StageOutput::with_warnings(sections, warnings)
    }

    /// Scan 1-based pages `first..=last`. Pages outside the provider are skipped;
    /// an inverted span scans nothing.
    fn collect_stats<P: PageTextProvider + ?Sized>(
        &self,
        provider: &P,
        first: u32,
        last: u32,
    ) -> std::result::Result<SpanStats, (usize, ExtractionError)> {
        let mut stats = SpanStats::default();
        let page_count = u32::try_from(provider.page_count()).unwrap_or(u32::MAX);

        // clamp to the provider's 1-based page range
        let first = first.max(1);
        let last = last.min(page_count);

        for page in first..=last {
            let index = (page - 1) as usize;
            let text = provider.text(index).map_err(|e| (index, e))?;
            let has_tables = provider.has_tables(index).map_err(|e| (index, e))?;

            stats.has_tables |= has_tables;
            stats.has_figures |= self.figure_regex.is_match(&text);
            stats.word_count += text.split_whitespace().count() as u64;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryProvider;

    fn spanner() -> SectionSpanner {
        SectionSpanner::new(&SpannerConfig::default()).unwrap()
    }

    fn entries(pages: &[(&str, u32)]) -> Vec<OutlineEntry> {
        pages
            .iter()
            .map(|(id, page)| OutlineEntry::new(id, "Heading", *page))
            .collect()
    }

    #[test]
    fn test_shared_page_gives_degenerate_span() {
        let provider = InMemoryProvider::new(vec![""; 70]);
        let result = spanner().span(&entries(&[("2", 53), ("2.1", 53), ("2.2", 60)]), &provider);
        let sections = result.value;

        assert_eq!(sections[0].content_start, 53);
        assert_eq!(sections[0].content_end, Some(52));
        assert!(sections[0].is_degenerate());
        assert_eq!(sections[1].content_end, Some(59));
        assert_eq!(sections[2].content_end, None);
    }

    #[test]
    fn test_stats_over_span() {
        let provider = InMemoryProvider::with_tables(vec![
            ("title page", false),
            ("one two three", false),
            ("See Figure 4 below", true),
            ("last page words", false),
        ]);
        let result = spanner().span(&entries(&[("1", 2), ("2", 4)]), &provider);
        let first = &result.value[0];

        assert_eq!(first.content_end, Some(3));
        assert!(first.has_tables);
        assert!(first.has_figures);
        assert_eq!(first.word_count, 7);

        let last = &result.value[1];
        assert_eq!(last.word_count, 3);
        assert!(!last.has_tables);
    }

    #[test]
    fn test_out_of_range_pages_skipped() {
        let provider = InMemoryProvider::new(vec!["alpha beta"]);
        let result = spanner().span(&entries(&[("1", 1), ("2", 40)]), &provider);
        assert!(result.warnings.is_empty());
        assert_eq!(result.value[0].word_count, 2);
        assert_eq!(result.value[1].word_count, 0);
    }

    struct FailingPage(usize);

    impl PageTextProvider for FailingPage {
        fn page_count(&self) -> usize {
            6
        }

        fn text(&self, index: usize) -> Result<String> {
            if index == self.0 {
                return Err(ExtractionError::PageText {
                    page: index,
                    reason: "bad page".to_string(),
                });
            }
            Ok("word word".to_string())
        }

        fn has_tables(&self, _index: usize) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_provider_failure_contained_to_section() {
        // page 3 (index 2) belongs to the first section only
        let result = spanner().span(&entries(&[("1", 1), ("2", 4)]), &FailingPage(2));

        assert_eq!(result.value[0].word_count, 0);
        assert!(!result.value[0].has_tables);
        assert_eq!(result.value[1].word_count, 2);
        assert!(result.value[1].has_tables);
        assert!(matches!(
            result.warnings.as_slice(),
            [StageWarning::ProviderFailure { page_index: 2, stage: PipelineStage::SectionSpanning, .. }]
        ));
    }

    #[test]
    fn test_huge_next_page_is_clamped() {
        let provider = InMemoryProvider::new(vec!["one two", "three"]);
        let start = std::time::Instant::now();
        let sections = spanner()
            .span(&entries(&[("1", 2), ("2", 4_000_000_000)]), &provider)
            .value;

        assert!(start.elapsed() < std::time::Duration::from_millis(100));
        assert_eq!(sections[0].content_end, Some(3_999_999_999));
        assert_eq!(sections[0].word_count, 1);
        assert_eq!(sections[1].word_count, 0);
    }

    #[test]
    fn test_page_zero_start_is_clamped() {
        let provider = InMemoryProvider::new(vec!["alpha beta", "gamma"]);
        let sections = spanner().span(&entries(&[("1", 0), ("2", 2)]), &provider).value;
        assert_eq!(sections[0].content_end, Some(1));
        assert_eq!(sections[0].word_count, 2);
    }

    #[test]
    fn test_invalid_figure_pattern() {
        let config = SpannerConfig {
            figure_pattern: "figure(".to_string(),
        };
        assert!(SectionSpanner::new(&config).is_err());
    }
}
