//! Wire records written to the JSON Lines files.
//!
//! Field names are part of the output format consumed downstream and must not change.

use crate::types::{DocumentMetadata, OutlineEntry, Section};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of `usb_pd_toc.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocRecord {
    pub doc_title: String,
    pub section_id: String,
    pub title: String,
    pub page: u32,
    pub level: u32,
    pub parent_id: Option<String>,
    pub full_path: String,
    pub tags: Vec<String>,
}

impl TocRecord {
    pub fn from_entry(doc_title: &str, entry: &OutlineEntry) -> Self {
        Self {
            doc_title: doc_title.to_string(),
            section_id: entry.identifier.clone(),
            title: entry.title.clone(),
            page: entry.page,
            level: entry.level,
            parent_id: entry.parent.clone(),
            full_path: entry.full_path(),
            tags: entry.tags.clone(),
        }
    }
}

/// One line of `usb_pd_spec.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    pub doc_title: String,
    pub section_id: String,
    pub title: String,
    pub page: u32,
    pub level: u32,
    pub parent_id: Option<String>,
    pub full_path: String,
    pub tags: Vec<String>,
    pub content_start: u32,
    pub content_end: Option<u32>,
    pub has_tables: bool,
    pub has_figures: bool,
    pub word_count: u64,
}

impl SpecRecord {
    pub fn from_section(doc_title: &str, section: &Section) -> Self {
        let entry = &section.entry;
        Self {
            doc_title: doc_title.to_string(),
            section_id: entry.identifier.clone(),
            title: entry.title.clone(),
            page: entry.page,
            level: entry.level,
            parent_id: entry.parent.clone(),
            full_path: entry.full_path(),
            tags: entry.tags.clone(),
            content_start: section.content_start,
            content_end: section.content_end,
            has_tables: section.has_tables,
            has_figures: section.has_figures,
            word_count: section.word_count,
        }
    }
}

/// The single line of `usb_pd_metadata.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub doc_title: String,
    pub total_pages: usize,
    pub total_sections: usize,
    pub total_tables: usize,
    pub total_figures: usize,
    pub max_level: u32,
    pub parsing_timestamp: DateTime<Utc>,
    pub pdf_file_size: u64,
    pub parsing_errors: Vec<String>,
}

impl From<&DocumentMetadata> for MetadataRecord {
    fn from(metadata: &DocumentMetadata) -> Self {
        Self {
            doc_title: metadata.doc_title.clone(),
            total_pages: metadata.total_pages,
            total_sections: metadata.total_sections,
            total_tables: metadata.total_tables,
            total_figures: metadata.total_figures,
            max_level: metadata.max_level,
            parsing_timestamp: metadata.generated_at,
            pdf_file_size: metadata.source_size,
            parsing_errors: metadata.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> Section {
        let mut entry = OutlineEntry::new("2.1", "Introduction", 53);
        entry.parent = Some("2".to_string());
        entry.tags = vec!["overview".to_string()];
        Section {
            entry,
            content_start: 53,
            content_end: None,
            has_tables: false,
            has_figures: true,
            word_count: 321,
        }
    }

    #[test]
    fn test_spec_record_round_trip() {
        let record = SpecRecord::from_section("USB PD", &section());
        let line = serde_json::to_string(&record).unwrap();
        let parsed: SpecRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_absent_values_serialize_as_null() {
        let toc = TocRecord::from_entry("USB PD", &OutlineEntry::new("2", "Overview", 53));
        let value = serde_json::to_value(&toc).unwrap();
        assert!(value["parent_id"].is_null());
        assert_eq!(value["full_path"], "2 Overview");

        let spec = serde_json::to_value(SpecRecord::from_section("USB PD", &section())).unwrap();
        assert!(spec["content_end"].is_null());
        assert_eq!(spec["parent_id"], "2");
    }

    #[test]
    fn test_metadata_record_round_trip() {
        let metadata = DocumentMetadata::from_sections(
            "USB PD",
            120,
            &[section()],
            4096,
            vec!["Parent 3.4 not found for 3.4.1".to_string()],
        );
        let record = MetadataRecord::from(&metadata);
        assert_eq!(record.pdf_file_size, 4096);
        assert_eq!(record.total_figures, 1);

        let line = serde_json::to_string(&record).unwrap();
        let parsed: MetadataRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
    }
}
