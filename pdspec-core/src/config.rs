use crate::error::{ExtractionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Prefix for environment variable overrides, e.g. `PDSPEC_STRICT_MODE=true`
pub const ENV_PREFIX: &str = "PDSPEC_";

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    100
}

/// Complete pipeline configuration. Every section falls back to its defaults
/// when omitted from a YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    pub document: DocumentConfig,
    pub classifier: ClassifierConfig,
    pub matcher: MatcherConfig,
    pub tagging: TaggingConfig,
    pub spanner: SpannerConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Title used when none of the early lines look like one
    pub default_title: String,
    /// Pages scanned for a title line
    pub title_search_pages: usize,
    /// Lines scanned per page for a title line
    pub title_search_lines: usize,
    /// Title candidates must be strictly longer than this (characters)
    pub min_title_len: usize,
    /// Title candidates must be strictly shorter than this (characters)
    pub max_title_len: usize,
    /// A title line must contain one of these (lower-cased comparison)
    pub title_keywords: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            default_title: "USB Power Delivery Specification".to_string(),
            title_search_pages: 3,
            title_search_lines: 10,
            min_title_len: 10,
            max_title_len: 200,
            title_keywords: vec![
                "usb".to_string(),
                "power delivery".to_string(),
                "specification".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Only the first N pages are considered as outline candidates
    pub max_search_pages: usize,
    /// A page needs strictly more numbered lines than this to qualify on density alone
    pub numbered_line_threshold: usize,
    /// Lower-case terms that mark a page as an outline candidate
    pub indicators: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_search_pages: 20,
            numbered_line_threshold: 3,
            indicators: vec![
                "contents".to_string(),
                "table of contents".to_string(),
                "toc".to_string(),
                "index".to_string(),
                "overview".to_string(),
                "introduction".to_string(),
                "specification".to_string(),
                "requirements".to_string(),
                "chapters".to_string(),
                "sections".to_string(),
            ],
        }
    }
}

/// One heading pattern. Patterns are tried by ascending priority; the first match wins.
///
/// The regex must define named groups `id` and `title`; `page` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub regex: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub patterns: Vec<PatternConfig>,
    /// Deepest outline level accepted; deeper identifiers do not match
    pub max_section_level: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                PatternConfig {
                    regex: r"^(?P<id>\d+(?:\.\d+)*)\s+(?P<title>[^\n]+?)(?:\s+(?P<page>\d+))?$"
                        .to_string(),
                    priority: 1,
                    description: "Numbered sections with optional page numbers".to_string(),
                },
                PatternConfig {
                    regex: r"^(?P<id>\d+(?:\.\d+)*)\s+(?P<title>[^\n]+?)\s+(?P<page>\d+)$"
                        .to_string(),
                    priority: 2,
                    description: "Numbered sections with page numbers at end".to_string(),
                },
                PatternConfig {
                    regex: r"^(?:Chapter\s+)?(?P<id>\d+)\s+(?P<title>[^\n]+?)(?:\s+(?P<page>\d+))?$"
                        .to_string(),
                    priority: 3,
                    description: "Chapter-based sections".to_string(),
                },
            ],
            max_section_level: 5,
        }
    }
}

/// Category tag assigned when any keyword occurs in the lower-cased title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(tag: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Domain terms collected as tags whenever they occur in a title
    pub vocabulary: Vec<String>,
    /// Ordered rules; only the first matching rule contributes a tag
    pub categories: Vec<CategoryRule>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        let vocabulary = [
            // Core concepts
            "power", "delivery", "contract", "negotiation", "communication",
            "protocol", "state", "machine", "voltage", "current", "cable",
            // Technical terms
            "sop", "sop'", "sop''", "collision", "avoidance", "plug",
            "source", "sink", "dual-role", "pd", "usb", "type-c",
            // Operational terms
            "operational", "capability", "compatibility", "revision",
            "implementation", "requirements", "specification",
        ];

        Self {
            vocabulary: vocabulary.iter().map(|t| t.to_string()).collect(),
            categories: vec![
                CategoryRule::new("overview", &["overview", "introduction", "background", "scope"]),
                CategoryRule::new(
                    "requirements",
                    &["requirements", "specifications", "standards", "compliance"],
                ),
                CategoryRule::new(
                    "implementation",
                    &["implementation", "design", "architecture", "structure"],
                ),
                CategoryRule::new("protocol", &["protocol", "communication", "signaling", "timing"]),
                CategoryRule::new("hardware", &["hardware", "cable", "connector", "plug", "port"]),
                CategoryRule::new("software", &["software", "firmware", "driver", "application"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpannerConfig {
    /// Regex that marks a page as referencing a figure
    pub figure_pattern: String,
}

impl Default for SpannerConfig {
    fn default() -> Self {
        Self {
            figure_pattern: r"(?i)figure\s+\d+".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject records that violate the schema instead of writing them with a warning
    pub strict_mode: bool,
    /// Cap on consistency messages; the remainder is summarised in one line
    pub max_validation_errors: usize,
    /// Compare outline and section page numbers
    #[serde(default = "default_true")]
    pub check_page_consistency: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_validation_errors: 100,
            check_page_consistency: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub toc_file: String,
    pub spec_file: String,
    pub metadata_file: String,
    pub report_file: String,
    pub samples_dir: String,
    /// Write the xlsx validation report alongside the JSONL files
    pub generate_validation_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            toc_file: "usb_pd_toc.jsonl".to_string(),
            spec_file: "usb_pd_spec.jsonl".to_string(),
            metadata_file: "usb_pd_metadata.jsonl".to_string(),
            report_file: "validation_report.xlsx".to_string(),
            samples_dir: "samples".to_string(),
            generate_validation_report: true,
        }
    }
}

impl ExtractionConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ExtractionError::Config(e.to_string()))
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!(path = %p.display(), error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Apply `PDSPEC_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; unparseable values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        override_parsed(get("MAX_TOC_SEARCH_PAGES"), &mut self.classifier.max_search_pages);
        override_parsed(
            get("NUMBERED_LINE_THRESHOLD"),
            &mut self.classifier.numbered_line_threshold,
        );
        override_parsed(get("MAX_SECTION_LEVEL"), &mut self.matcher.max_section_level);
        override_parsed(
            get("MAX_VALIDATION_ERRORS"),
            &mut self.validation.max_validation_errors,
        );
        if let Some(value) = get("STRICT_MODE") {
            self.validation.strict_mode = parse_flag(&value);
        }
        if let Some(value) = get("DEFAULT_TITLE") {
            self.document.default_title = value;
        }

        self
    }
}

fn override_parsed<T: FromStr>(value: Option<String>, target: &mut T) {
    let Some(raw) = value else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => debug!(value = %raw, "ignoring unparseable config override"),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ExtractionConfig::default();
        assert_eq!(config.classifier.max_search_pages, 20);
        assert_eq!(config.classifier.numbered_line_threshold, 3);
        assert_eq!(config.classifier.indicators.len(), 10);
        assert_eq!(config.matcher.patterns.len(), 3);
        assert_eq!(config.matcher.max_section_level, 5);
        assert!(!config.validation.strict_mode);
        assert_eq!(config.document.default_title, "USB Power Delivery Specification");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
classifier:
  max_search_pages: 8
validation:
  strict_mode: true
"#;
        let config = ExtractionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.classifier.max_search_pages, 8);
        assert_eq!(config.classifier.numbered_line_threshold, 3);
        assert!(config.validation.strict_mode);
        assert!(config.validation.check_page_consistency);
        assert_eq!(config.matcher, MatcherConfig::default());
    }

    #[test]
    fn test_pattern_priority_defaults_when_omitted() {
        let yaml = r#"
matcher:
  patterns:
    - regex: '^(?P<id>\d+)\s+(?P<title>.+)$'
"#;
        let config = ExtractionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.matcher.patterns.len(), 1);
        assert_eq!(config.matcher.patterns[0].priority, 100);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = ExtractionConfig::from_yaml("classifier: [not, a, map]").unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)));
    }

    #[test]
    fn test_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PDSPEC_MAX_TOC_SEARCH_PAGES", "12"),
            ("PDSPEC_NUMBERED_LINE_THRESHOLD", "many"),
            ("PDSPEC_STRICT_MODE", "yes"),
            ("PDSPEC_DEFAULT_TITLE", "Custom Title"),
        ]);
        let config = ExtractionConfig::default()
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.classifier.max_search_pages, 12);
        assert_eq!(config.classifier.numbered_line_threshold, 3);
        assert!(config.validation.strict_mode);
        assert_eq!(config.document.default_title, "Custom Title");
    }

    #[test]
    fn test_load_with_fallback_on_missing_file() {
        let config = ExtractionConfig::load_with_fallback(Some(Path::new(
            "/definitely/not/here/pdspec.yaml",
        )));
        assert_eq!(config, ExtractionConfig::default());
    }
}
