use super::hierarchy::sort_key;
use crate::config::ValidationConfig;
use crate::types::{OutlineEntry, Section};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonStatus {
    Match,
    PageMismatch,
    Missing,
    Extra,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComparisonStatus::Match => "MATCH",
            ComparisonStatus::PageMismatch => "PAGE_MISMATCH",
            ComparisonStatus::Missing => "MISSING",
            ComparisonStatus::Extra => "EXTRA",
        };
        f.write_str(label)
    }
}

/// Outline entry and derived section for one identifier, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub identifier: String,
    pub outline_title: Option<String>,
    pub section_title: Option<String>,
    pub outline_page: Option<u32>,
    pub section_page: Option<u32>,
    pub outline_level: Option<u32>,
    pub section_level: Option<u32>,
    pub status: ComparisonStatus,
    /// section page minus outline page, when both exist
    pub page_delta: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancySummary {
    pub outline_entries: usize,
    pub sections: usize,
    pub matched: usize,
    pub missing: usize,
    pub extra: usize,
    pub page_mismatches: usize,
    pub unresolved_parents: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub summary: DiscrepancySummary,
    pub rows: Vec<ComparisonRow>,
    pub messages: Vec<String>,
    pub is_valid: bool,
}

// ConsistencyValidator - diffs the declared outline against the derived sections
pub struct ConsistencyValidator {
    max_messages: usize,
    check_pages: bool,
}

impl ConsistencyValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            max_messages: config.max_validation_errors,
            check_pages: config.check_page_consistency,
        }
    }

    /// Validity flag plus the (capped) list of discrepancy messages.
    pub fn validate(&self, entries: &[OutlineEntry], sections: &[Section]) -> (bool, Vec<String>) {
        let report = self.report(entries, sections);
        (report.is_valid, report.messages)
    }

    pub fn report(&self, entries: &[OutlineEntry], sections: &[Section]) -> DiscrepancyReport {
        // first occurrence wins when an identifier repeats
        let mut by_identifier: BTreeMap<(Vec<u64>, &str), (Option<&OutlineEntry>, Option<&Section>)> =
            BTreeMap::new();
        for entry in entries {
            let slot = by_identifier
                .entry((sort_key(&entry.identifier), entry.identifier.as_str()))
                .or_default();
            slot.0.get_or_insert(entry);
        }
        for section in sections {
            let slot = by_identifier
                .entry((sort_key(section.identifier()), section.identifier()))
                .or_default();
            slot.1.get_or_insert(section);
        }

        let mut summary = DiscrepancySummary {
            outline_entries: entries.len(),
            sections: sections.len(),
            ..DiscrepancySummary::default()
        };
        let mut messages = Vec::new();
        let mut rows = Vec::with_capacity(by_identifier.len());

        for ((_, identifier), (outline, section)) in by_identifier {
            let row = self.compare(identifier, outline, section);
            match row.status {
                ComparisonStatus::Match => summary.matched += 1,
                ComparisonStatus::Missing => {
                    summary.missing += 1;
                    messages.push(format!(
                        "Section {identifier} is in the outline but missing from parsed sections"
                    ));
                }
                ComparisonStatus::Extra => {
                    summary.extra += 1;
                    messages.push(format!(
                        "Section {identifier} was parsed but is not in the outline"
                    ));
                }
                ComparisonStatus::PageMismatch => {
                    summary.page_mismatches += 1;
                    messages.push(format!(
                        "Page mismatch for {identifier}: outline page {}, section page {} (delta {:+})",
                        row.outline_page.unwrap_or_default(),
                        row.section_page.unwrap_or_default(),
                        row.page_delta.unwrap_or_default()
                    ));
                }
            }
            rows.push(row);
        }

        let known: HashSet<&str> = entries.iter().map(|e| e.identifier.as_str()).collect();
        for entry in entries {
            if let Some(parent) = entry.parent.as_deref() {
                if !known.contains(parent) {
                    summary.unresolved_parents += 1;
                    messages.push(format!("Parent {parent} not found for {}", entry.identifier));
                }
            }
        }

        let is_valid = summary.missing == 0
            && summary.extra == 0
            && summary.page_mismatches == 0
            && summary.unresolved_parents == 0;

        if messages.len() > self.max_messages {
            let hidden = messages.len() - self.max_messages;
            messages.truncate(self.max_messages);
            messages.push(format!("… {hidden} more"));
        }

        debug!(
            matched = summary.matched,
            missing = summary.missing,
            extra = summary.extra,
            page_mismatches = summary.page_mismatches,
            is_valid,
            "consistency check complete"
        );

        DiscrepancyReport {
            summary,
            rows,
            messages,
            is_valid,
        }
    }

    fn compare(
        &self,
        identifier: &str,
        outline: Option<&OutlineEntry>,
        section: Option<&Section>,
    ) -> ComparisonRow {
        let outline_page = outline.map(|e| e.page);
        let section_page = section.map(|s| s.content_start);
        let page_delta = match (outline_page, section_page) {
            (Some(o), Some(s)) => Some(i64::from(s) - i64::from(o)),
            _ => None,
        };

        let status = match (outline, section) {
            (Some(_), None) => ComparisonStatus::Missing,
            (None, Some(_)) => ComparisonStatus::Extra,
            _ if self.check_pages && page_delta.is_some_and(|d| d != 0) => {
                ComparisonStatus::PageMismatch
            }
            _ => ComparisonStatus::Match,
        };

        ComparisonRow {
            identifier: identifier.to_string(),
            outline_title: outline.map(|e| e.title.clone()),
            section_title: section.map(|s| s.entry.title.clone()),
            outline_page,
            section_page,
            outline_level: outline.map(|e| e.level),
            section_level: section.map(|s| s.entry.level),
            status,
            page_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(identifier: &str, page: u32) -> OutlineEntry {
        OutlineEntry::new(identifier, "Heading", page)
    }

    fn section(identifier: &str, page: u32) -> Section {
        Section {
            entry: entry(identifier, page),
            content_start: page,
            content_end: None,
            has_tables: false,
            has_figures: false,
            word_count: 0,
        }
    }

    fn validator() -> ConsistencyValidator {
        ConsistencyValidator::new(&ValidationConfig::default())
    }

    #[test]
    fn test_matching_outline_is_valid() {
        let entries = vec![entry("1", 3), entry("2", 5)];
        let sections = vec![section("1", 3), section("2", 5)];
        let (valid, messages) = validator().validate(&entries, &sections);
        assert!(valid);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_missing_extra_and_mismatch() {
        let entries = vec![entry("1", 3), entry("2", 5), entry("10", 40)];
        let sections = vec![section("1", 3), section("2", 7), section("3", 9)];
        let report = validator().report(&entries, &sections);

        assert!(!report.is_valid);
        assert_eq!(report.summary.matched, 1);
        assert_eq!(report.summary.missing, 1);
        assert_eq!(report.summary.extra, 1);
        assert_eq!(report.summary.page_mismatches, 1);

        let statuses: Vec<(&str, ComparisonStatus)> = report
            .rows
            .iter()
            .map(|r| (r.identifier.as_str(), r.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("1", ComparisonStatus::Match),
                ("2", ComparisonStatus::PageMismatch),
                ("3", ComparisonStatus::Extra),
                ("10", ComparisonStatus::Missing),
            ]
        );
        assert_eq!(report.rows[1].page_delta, Some(2));
        assert!(report.messages[0].contains("delta +2"));
    }

    #[test]
    fn test_unresolved_parent_invalidates() {
        let mut child = entry("4.1", 8);
        child.parent = Some("4".to_string());
        let report = validator().report(&[child], &[section("4.1", 8)]);
        assert!(!report.is_valid);
        assert_eq!(report.summary.unresolved_parents, 1);
        assert_eq!(report.messages, vec!["Parent 4 not found for 4.1"]);
    }

    #[test]
    fn test_messages_capped() {
        let config = ValidationConfig {
            max_validation_errors: 2,
            ..ValidationConfig::default()
        };
        let entries: Vec<OutlineEntry> = (1..=5).map(|i| entry(&i.to_string(), i)).collect();
        let (valid, messages) = ConsistencyValidator::new(&config).validate(&entries, &[]);
        assert!(!valid);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], "… 3 more");
    }

    #[test]
    fn test_page_check_can_be_disabled() {
        let config = ValidationConfig {
            check_page_consistency: false,
            ..ValidationConfig::default()
        };
        let report = ConsistencyValidator::new(&config).report(&[entry("1", 3)], &[section("1", 9)]);
        assert!(report.is_valid);
        assert_eq!(report.rows[0].page_delta, Some(6));
    }

    #[test]
    fn test_report_is_deterministic() {
        let entries = vec![entry("2.1", 4), entry("1", 1), entry("2", 3)];
        let sections = vec![section("2", 3), section("9", 30), section("1", 2)];
        let first = serde_json::to_string(&validator().report(&entries, &sections)).unwrap();
        let second = serde_json::to_string(&validator().report(&entries, &sections)).unwrap();
        assert_eq!(first, second);
    }
}
