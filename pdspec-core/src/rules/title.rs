use crate::config::DocumentConfig;
use crate::providers::PageTextProvider;
use crate::types::{PipelineStage, StageOutput, StageWarning};
use tracing::warn;

// TitleExtractor - first early line that looks like a document title
pub struct TitleExtractor {
    config: DocumentConfig,
}

impl TitleExtractor {
    pub fn new(config: &DocumentConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Falls back to the configured default title. Unreadable pages are skipped
    /// with a `ProviderFailure` warning.
    pub fn extract<P: PageTextProvider + ?Sized>(&self, provider: &P) -> StageOutput<String> {
        let pages = provider.page_count().min(self.config.title_search_pages);
        let mut warnings = Vec::new();

        for index in 0..pages {
            let text = match provider.text(index) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = index + 1, error = %e, "title search skipped unreadable page");
                    warnings.push(StageWarning::ProviderFailure {
                        stage: PipelineStage::TitleExtraction,
                        page_index: index,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let found = text
                .lines()
                .take(self.config.title_search_lines)
                .map(str::trim)
                .find(|line| self.looks_like_title(line));
            if let Some(title) = found {
                return StageOutput::with_warnings(title.to_string(), warnings);
            }
        }

        StageOutput::with_warnings(self.config.default_title.clone(), warnings)
    }

    fn looks_like_title(&self, line: &str) -> bool {
        let len = line.chars().count();
        if len <= self.config.min_title_len || len >= self.config.max_title_len {
            return false;
        }
        let lower = line.to_lowercase();
        self.config
            .title_keywords
            .iter()
            .any(|k| lower.contains(k.to_lowercase().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryProvider;

    fn extractor() -> TitleExtractor {
        TitleExtractor::new(&DocumentConfig::default())
    }

    #[test]
    fn test_first_qualifying_line() {
        let provider = InMemoryProvider::new(vec![
            "USB\nUniversal Serial Bus Power Delivery Specification\nRevision 3.1",
        ]);
        assert_eq!(
            extractor().extract(&provider).value,
            "Universal Serial Bus Power Delivery Specification"
        );
    }

    #[test]
    fn test_only_first_lines_considered() {
        let mut page = "filler line\n".repeat(10);
        page.push_str("USB Power Delivery Specification");
        let provider = InMemoryProvider::new(vec![page]);
        assert_eq!(extractor().extract(&provider).value, "USB Power Delivery Specification");
    }

    #[test]
    fn test_default_when_nothing_qualifies() {
        let config = DocumentConfig {
            default_title: "Fallback".to_string(),
            ..DocumentConfig::default()
        };
        let provider = InMemoryProvider::new(vec!["short", "nothing relevant here at all"]);
        assert_eq!(TitleExtractor::new(&config).extract(&provider).value, "Fallback");
    }

    struct UnreadableCover;

    impl PageTextProvider for UnreadableCover {
        fn page_count(&self) -> usize {
            2
        }

        fn text(&self, index: usize) -> crate::error::Result<String> {
            match index {
                0 => Err(crate::error::ExtractionError::PageText {
                    page: 0,
                    reason: "corrupt stream".to_string(),
                }),
                _ => Ok("USB Power Delivery Specification".to_string()),
            }
        }

        fn has_tables(&self, _index: usize) -> crate::error::Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "unreadable-cover"
        }
    }

    #[test]
    fn test_unreadable_page_is_reported() {
        let result = extractor().extract(&UnreadableCover);
        assert_eq!(result.value, "USB Power Delivery Specification");
        assert!(matches!(
            result.warnings.as_slice(),
            [StageWarning::ProviderFailure {
                stage: PipelineStage::TitleExtraction,
                page_index: 0,
                ..
            }]
        ));
    }

    #[test]
    fn test_title_found_on_later_page() {
        let provider = InMemoryProvider::new(vec!["cover", "Type-C Cable Specification v2"]);
        assert_eq!(extractor().extract(&provider).value, "Type-C Cable Specification v2");
    }
}
