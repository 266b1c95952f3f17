//! The four tables of the validation workbook.

use crate::rules::consistency::{ComparisonRow, DiscrepancyReport};
use crate::types::{DocumentMetadata, OutlineEntry, Section};
use serde::Serialize;

const NOT_FOUND: &str = "NOT FOUND";
const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn int_or(value: Option<impl Into<i64>>, fallback: &str) -> Self {
        value.map_or_else(|| Cell::text(fallback), |v| Cell::Int(v.into()))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// One worksheet: a header row followed by data rows of the same width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Cell under `header` in row `row`, if both exist
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let column = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(column)
    }
}

/// Summary, ToC_vs_Parsed, Detailed_Analysis and Statistics, in that order.
pub fn report_tables(
    metadata: &DocumentMetadata,
    entries: &[OutlineEntry],
    sections: &[Section],
    report: &DiscrepancyReport,
) -> Vec<ReportTable> {
    vec![
        summary_table(metadata, entries, sections, report),
        comparison_table(&report.rows),
        detail_table(sections),
        statistics_table(sections),
    ]
}

fn summary_table(
    metadata: &DocumentMetadata,
    entries: &[OutlineEntry],
    sections: &[Section],
    report: &DiscrepancyReport,
) -> ReportTable {
    let mut table = ReportTable::new(
        "Summary",
        &[
            "Document Title",
            "Total Pages",
            "Total Sections in ToC",
            "Total Sections Parsed",
            "Total Tables Detected",
            "Total Figures Detected",
            "Maximum Section Level",
            "Parsing Timestamp",
            "Validation Status",
        ],
    );
    table.rows.push(vec![
        Cell::text(&metadata.doc_title),
        metadata.total_pages.into(),
        entries.len().into(),
        sections.len().into(),
        metadata.total_tables.into(),
        metadata.total_figures.into(),
        metadata.max_level.into(),
        Cell::text(metadata.generated_at.to_rfc3339()),
        Cell::text(if report.is_valid { "PASS" } else { "FAIL" }),
    ]);
    table
}

fn comparison_table(rows: &[ComparisonRow]) -> ReportTable {
    let mut table = ReportTable::new(
        "ToC_vs_Parsed",
        &[
            "Section ID",
            "ToC Title",
            "ToC Page",
            "ToC Level",
            "Parsed Title",
            "Parsed Page",
            "Parsed Level",
            "Status",
            "Page Difference",
        ],
    );
    for row in rows {
        table.rows.push(vec![
            Cell::text(&row.identifier),
            Cell::text(row.outline_title.as_deref().unwrap_or(NOT_FOUND)),
            Cell::int_or(row.outline_page, NOT_APPLICABLE),
            Cell::int_or(row.outline_level, NOT_APPLICABLE),
            Cell::text(row.section_title.as_deref().unwrap_or(NOT_FOUND)),
            Cell::int_or(row.section_page, NOT_APPLICABLE),
            Cell::int_or(row.section_level, NOT_APPLICABLE),
            Cell::text(row.status.to_string()),
            Cell::int_or(row.page_delta, NOT_APPLICABLE),
        ]);
    }
    table
}

fn detail_table(sections: &[Section]) -> ReportTable {
    let mut table = ReportTable::new(
        "Detailed_Analysis",
        &[
            "Section ID",
            "Title",
            "Level",
            "Page",
            "Parent ID",
            "Content Start",
            "Content End",
            "Has Tables",
            "Has Figures",
            "Word Count",
            "Tags",
        ],
    );
    for section in sections {
        let entry = &section.entry;
        table.rows.push(vec![
            Cell::text(&entry.identifier),
            Cell::text(&entry.title),
            entry.level.into(),
            entry.page.into(),
            entry.parent.as_deref().map_or(Cell::Empty, Cell::text),
            section.content_start.into(),
            section.content_end.map_or(Cell::Empty, Cell::from),
            section.has_tables.into(),
            section.has_figures.into(),
            section.word_count.into(),
            Cell::text(entry.tags.join(", ")),
        ]);
    }
    table
}

fn statistics_table(sections: &[Section]) -> ReportTable {
    let mut table = ReportTable::new(
        "Statistics",
        &[
            "Total Sections",
            "Level 1 Sections",
            "Level 2 Sections",
            "Level 3 Sections",
            "Level 4+ Sections",
            "Sections with Tables",
            "Sections with Figures",
            "Average Word Count",
            "Total Word Count",
        ],
    );

    let at_level = |level: u32| sections.iter().filter(|s| s.entry.level == level).count();
    let total_words: u64 = sections.iter().map(|s| s.word_count).sum();
    let average = total_words as f64 / sections.len().max(1) as f64;

    table.rows.push(vec![
        sections.len().into(),
        at_level(1).into(),
        at_level(2).into(),
        at_level(3).into(),
        sections.iter().filter(|s| s.entry.level >= 4).count().into(),
        sections.iter().filter(|s| s.has_tables).count().into(),
        sections.iter().filter(|s| s.has_figures).count().into(),
        Cell::Float(average),
        total_words.into(),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::rules::ConsistencyValidator;

    fn section(identifier: &str, page: u32, words: u64) -> Section {
        Section {
            entry: OutlineEntry::new(identifier, "Heading", page),
            content_start: page,
            content_end: None,
            has_tables: identifier == "1",
            has_figures: false,
            word_count: words,
        }
    }

    fn tables() -> Vec<ReportTable> {
        let entries = vec![
            OutlineEntry::new("1", "Heading", 3),
            OutlineEntry::new("1.1", "Heading", 4),
            OutlineEntry::new("2", "Heading", 9),
        ];
        let sections = vec![section("1", 3, 10), section("1.1", 5, 20)];
        let report = ConsistencyValidator::new(&ValidationConfig::default()).report(&entries, &sections);
        let metadata = DocumentMetadata::from_sections("USB PD", 12, &sections, 100, Vec::new());
        report_tables(&metadata, &entries, &sections, &report)
    }

    #[test]
    fn test_sheet_names_in_order() {
        let names: Vec<String> = tables().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Summary", "ToC_vs_Parsed", "Detailed_Analysis", "Statistics"]);
    }

    #[test]
    fn test_summary_reflects_validity() {
        let tables = tables();
        assert_eq!(tables[0].cell(0, "Validation Status"), Some(&Cell::text("FAIL")));
        assert_eq!(tables[0].cell(0, "Total Sections in ToC"), Some(&Cell::Int(3)));
    }

    #[test]
    fn test_comparison_placeholders() {
        let tables = tables();
        let comparison = &tables[1];
        assert_eq!(comparison.rows.len(), 3);
        assert_eq!(comparison.cell(1, "Status"), Some(&Cell::text("PAGE_MISMATCH")));
        assert_eq!(comparison.cell(1, "Page Difference"), Some(&Cell::Int(1)));
        assert_eq!(comparison.cell(2, "Parsed Title"), Some(&Cell::text("NOT FOUND")));
        assert_eq!(comparison.cell(2, "Parsed Page"), Some(&Cell::text("N/A")));
    }

    #[test]
    fn test_statistics() {
        let tables = tables();
        let stats = &tables[3];
        assert_eq!(stats.cell(0, "Level 2 Sections"), Some(&Cell::Int(1)));
        assert_eq!(stats.cell(0, "Sections with Tables"), Some(&Cell::Int(1)));
        assert_eq!(stats.cell(0, "Average Word Count"), Some(&Cell::Float(15.0)));
        assert_eq!(stats.cell(0, "Total Word Count"), Some(&Cell::Int(30)));
    }

    #[test]
    fn test_empty_sections_average_is_zero() {
        let table = statistics_table(&[]);
        assert_eq!(table.cell(0, "Average Word Count"), Some(&Cell::Float(0.0)));
    }
}
