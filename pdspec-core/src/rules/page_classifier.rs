use crate::config::ClassifierConfig;
use crate::providers::PageTextProvider;
use crate::types::{PipelineStage, StageOutput, StageWarning};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static NUMBERED_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

// PageClassifier - picks the early pages likely to hold the table of contents
pub struct PageClassifier {
    max_search_pages: usize,
    numbered_line_threshold: usize,
    indicators: Vec<String>,
}

impl PageClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            max_search_pages: config.max_search_pages,
            numbered_line_threshold: config.numbered_line_threshold,
            indicators: config.indicators.iter().map(|i| i.to_lowercase()).collect(),
        }
    }

    /// Ascending 0-based indices of candidate pages among the first `max_search_pages`.
    pub fn classify<P: PageTextProvider + ?Sized>(&self, provider: &P) -> StageOutput<Vec<usize>> {
        let searched = provider.page_count().min(self.max_search_pages);
        let mut candidates = Vec::new();
        let mut warnings = Vec::new();

        for index in 0..searched {
            let text = match provider.text(index) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = index + 1, error = %e, "skipping unreadable page");
                    warnings.push(StageWarning::ProviderFailure {
                        stage: PipelineStage::PageClassification,
                        page_index: index,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if self.is_candidate(&text) {
                debug!(page = index + 1, "outline candidate page");
                candidates.push(index);
            }
        }

        if candidates.is_empty() {
            warn!(searched_pages = searched, "no outline candidate pages found");
            warnings.push(StageWarning::NoCandidatePages {
                searched_pages: searched,
            });
        }

        StageOutput::with_warnings(candidates, warnings)
    }

    /// Indicator term present, or more numbered lines than the threshold.
    pub fn is_candidate(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        if self.indicators.iter().any(|term| lower.contains(term.as_str())) {
            return true;
        }
        numbered_line_count(text) > self.numbered_line_threshold
    }
}

fn numbered_line_count(text: &str) -> usize {
    text.lines()
        .filter(|line| NUMBERED_LINE_REGEX.is_match(line.trim()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, Result};
    use crate::providers::InMemoryProvider;

    fn classifier() -> PageClassifier {
        PageClassifier::new(&ClassifierConfig::default())
    }

    #[test]
    fn test_indicator_term_marks_candidate() {
        assert!(classifier().is_candidate("TABLE OF CONTENTS\nfoo"));
        assert!(!classifier().is_candidate("plain body text about voltage"));
    }

    #[test]
    fn test_numbered_line_density_threshold() {
        let three = "1. a\n2. b\n3. c";
        let four = "1. a\n2. b\n  3. c\n4. d";
        assert!(!classifier().is_candidate(three));
        assert!(classifier().is_candidate(four));
    }

    #[test]
    fn test_only_first_pages_searched() {
        let config = ClassifierConfig {
            max_search_pages: 2,
            ..ClassifierConfig::default()
        };
        let provider = InMemoryProvider::new(vec!["body", "Contents", "Contents again"]);
        let result = PageClassifier::new(&config).classify(&provider);
        assert_eq!(result.value, vec![1]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_candidates_warns() {
        let provider = InMemoryProvider::new(vec!["body", "more body"]);
        let result = classifier().classify(&provider);
        assert!(result.value.is_empty());
        assert_eq!(
            result.warnings,
            vec![StageWarning::NoCandidatePages { searched_pages: 2 }]
        );
    }

    struct FlakyProvider;

    impl PageTextProvider for FlakyProvider {
        fn page_count(&self) -> usize {
            2
        }

        fn text(&self, index: usize) -> Result<String> {
            match index {
                0 => Err(ExtractionError::PageText {
                    page: 0,
                    reason: "corrupt stream".to_string(),
                }),
                _ => Ok("Table of Contents".to_string()),
            }
        }

        fn has_tables(&self, _index: usize) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn test_unreadable_page_is_skipped_with_warning() {
        let result = classifier().classify(&FlakyProvider);
        assert_eq!(result.value, vec![1]);
        assert!(matches!(
            result.warnings.as_slice(),
            [StageWarning::ProviderFailure { page_index: 0, .. }]
        ));
    }
}
