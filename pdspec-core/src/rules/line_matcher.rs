use crate::config::{MatcherConfig, PatternConfig};
use crate::error::{ExtractionError, Result};
use crate::types::{level_of, OutlineEntry};
use regex::Regex;

struct HeadingPattern {
    regex: Regex,
    priority: u32,
    description: String,
}

// LineMatcher - turns one outline line into an entry using priority-ordered patterns
pub struct LineMatcher {
    patterns: Vec<HeadingPattern>,
    max_section_level: u32,
}

impl LineMatcher {
    /// Compile the configured patterns, lowest priority value first.
    pub fn new(config: &MatcherConfig) -> Result<Self> {
        let mut patterns = config
            .patterns
            .iter()
            .map(compile_pattern)
            .collect::<Result<Vec<_>>>()?;
        patterns.sort_by_key(|p| p.priority);

        Ok(Self {
            patterns,
            max_section_level: config.max_section_level,
        })
    }

    /// Try the patterns in order; the first one that matches decides.
    ///
    /// `page` is the 1-based page the line sits on and becomes the entry's page
    /// unless the line carries a usable page number of its own.
    pub fn match_line(&self, line: &str, page: u32) -> Option<OutlineEntry> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let caps = self.patterns.iter().find_map(|p| p.regex.captures(line))?;

        let identifier = caps.name("id")?.as_str();
        let title = caps.name("title")?.as_str().trim();
        if title.is_empty() || level_of(identifier) > self.max_section_level {
            return None;
        }

        let page = caps
            .name("page")
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(page);

        Some(OutlineEntry::new(identifier, title, page))
    }

    /// Descriptions of the compiled patterns in the order they are tried.
    pub fn pattern_descriptions(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.description.as_str()).collect()
    }
}

fn compile_pattern(config: &PatternConfig) -> Result<HeadingPattern> {
    let invalid = |reason: String| ExtractionError::InvalidPattern {
        pattern: config.regex.clone(),
        reason,
    };

    let regex = Regex::new(&config.regex).map_err(|e| invalid(e.to_string()))?;
    let names: Vec<&str> = regex.capture_names().flatten().collect();
    if !names.contains(&"id") || !names.contains(&"title") {
        return Err(invalid("pattern must define named groups 'id' and 'title'".to_string()));
    }

    Ok(HeadingPattern {
        regex,
        priority: config.priority,
        description: config.description.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LineMatcher {
        LineMatcher::new(&MatcherConfig::default()).unwrap()
    }

    #[test]
    fn test_identifier_title_and_page() {
        let entry = matcher().match_line("2.1.3 Source Operation 54", 3).unwrap();
        assert_eq!(entry.identifier, "2.1.3");
        assert_eq!(entry.title, "Source Operation");
        assert_eq!(entry.page, 54);
        assert_eq!(entry.level, 3);
    }

    #[test]
    fn test_missing_page_defaults_to_line_page() {
        let entry = matcher().match_line("2 Overview", 7).unwrap();
        assert_eq!(entry.title, "Overview");
        assert_eq!(entry.page, 7);
    }

    #[test]
    fn test_zero_page_keeps_line_page() {
        let entry = matcher().match_line("3 Cable Assemblies 0", 12).unwrap();
        assert_eq!(entry.page, 12);
    }

    #[test]
    fn test_overflowing_page_keeps_line_page() {
        let entry = matcher()
            .match_line("3 Cable Assemblies 99999999999", 12)
            .unwrap();
        assert_eq!(entry.page, 12);
    }

    #[test]
    fn test_chapter_prefix() {
        let entry = matcher().match_line("Chapter 4 Electrical Requirements 80", 2).unwrap();
        assert_eq!(entry.identifier, "4");
        assert_eq!(entry.title, "Electrical Requirements");
        assert_eq!(entry.page, 80);
    }

    #[test]
    fn test_non_heading_lines() {
        let m = matcher();
        assert!(m.match_line("", 1).is_none());
        assert!(m.match_line("   ", 1).is_none());
        assert!(m.match_line("Revision History", 1).is_none());
        assert!(m.match_line("2.1", 1).is_none());
    }

    #[test]
    fn test_too_deep_identifier_is_no_match() {
        assert!(matcher().match_line("1.2.3.4.5.6 Deep Heading 9", 1).is_none());
        assert!(matcher().match_line("1.2.3.4.5 Deep Heading 9", 1).is_some());
    }

    #[test]
    fn test_priority_order_not_list_order() {
        let config = MatcherConfig {
            patterns: vec![
                PatternConfig {
                    regex: r"^(?P<id>\d+)\s+(?P<title>LOW.*?)\s+(?P<page>\d+)$".to_string(),
                    priority: 9,
                    description: "low".to_string(),
                },
                PatternConfig {
                    regex: r"^(?P<id>\d+)\s+(?P<title>.+)$".to_string(),
                    priority: 1,
                    description: "high".to_string(),
                },
            ],
            max_section_level: 5,
        };
        let m = LineMatcher::new(&config).unwrap();
        assert_eq!(m.pattern_descriptions(), vec!["high", "low"]);

        // both patterns match; the listed-first one would split off the page
        let entry = m.match_line("7 LOW Power 12", 3).unwrap();
        assert_eq!(entry.title, "LOW Power 12");
        assert_eq!(entry.page, 3);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = MatcherConfig {
            patterns: vec![PatternConfig {
                regex: r"^(?P<id>\d+".to_string(),
                priority: 1,
                description: String::new(),
            }],
            max_section_level: 5,
        };
        assert!(matches!(
            LineMatcher::new(&config),
            Err(ExtractionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_pattern_without_named_groups_rejected() {
        let config = MatcherConfig {
            patterns: vec![PatternConfig {
                regex: r"^(\d+)\s+(.+)$".to_string(),
                priority: 1,
                description: String::new(),
            }],
            max_section_level: 5,
        };
        assert!(LineMatcher::new(&config).is_err());
    }
}
