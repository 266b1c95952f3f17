//! Schema contract for the JSON Lines records, and validation of written output.

use crate::config::OutputConfig;
use crate::types::is_valid_identifier;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Toc,
    Section,
    Metadata,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Toc => "ToC",
            RecordKind::Section => "Section",
            RecordKind::Metadata => "Metadata",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Text,
    Integer,
    Boolean,
    TextList,
    NullableText,
    NullableInteger,
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    field_type: FieldType,
    required: bool,
    minimum: Option<i64>,
    maximum: Option<i64>,
    min_length: Option<usize>,
    identifier: bool,
    date_time: bool,
}

impl FieldRule {
    const fn new(name: &'static str, field_type: FieldType, required: bool) -> Self {
        Self {
            name,
            field_type,
            required,
            minimum: None,
            maximum: None,
            min_length: None,
            identifier: false,
            date_time: false,
        }
    }

    const fn min(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    const fn max(mut self, maximum: i64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    const fn non_empty(mut self) -> Self {
        self.min_length = Some(1);
        self
    }

    const fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    const fn date_time(mut self) -> Self {
        self.date_time = true;
        self
    }
}

use FieldType::{Boolean, Integer, NullableInteger, NullableText, Text, TextList};

const OUTLINE_FIELDS: [FieldRule; 8] = [
    FieldRule::new("doc_title", Text, true),
    FieldRule::new("section_id", Text, true).identifier(),
    FieldRule::new("title", Text, true).non_empty(),
    FieldRule::new("page", Integer, true).min(1),
    FieldRule::new("level", Integer, true).min(1).max(5),
    FieldRule::new("parent_id", NullableText, true),
    FieldRule::new("full_path", Text, true).non_empty(),
    FieldRule::new("tags", TextList, false),
];

const SECTION_FIELDS: [FieldRule; 5] = [
    FieldRule::new("content_start", Integer, false).min(1),
    FieldRule::new("content_end", NullableInteger, false),
    FieldRule::new("has_tables", Boolean, false),
    FieldRule::new("has_figures", Boolean, false),
    FieldRule::new("word_count", Integer, false).min(0),
];

const METADATA_FIELDS: [FieldRule; 9] = [
    FieldRule::new("doc_title", Text, true),
    FieldRule::new("total_pages", Integer, true).min(1),
    FieldRule::new("total_sections", Integer, true).min(0),
    FieldRule::new("total_tables", Integer, false).min(0),
    FieldRule::new("total_figures", Integer, false).min(0),
    FieldRule::new("max_level", Integer, false).min(1),
    FieldRule::new("parsing_timestamp", Text, true).date_time(),
    FieldRule::new("pdf_file_size", Integer, false).min(0),
    FieldRule::new("parsing_errors", TextList, false),
];

/// Field rules for one record kind. Properties not listed are rejected.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    kind: RecordKind,
    fields: Vec<FieldRule>,
}

impl RecordSchema {
    pub fn for_kind(kind: RecordKind) -> Self {
        let fields = match kind {
            RecordKind::Toc => OUTLINE_FIELDS.to_vec(),
            RecordKind::Section => OUTLINE_FIELDS
                .iter()
                .chain(SECTION_FIELDS.iter())
                .copied()
                .collect(),
            RecordKind::Metadata => METADATA_FIELDS.to_vec(),
        };
        Self { kind, fields }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Every violation found in `value`; empty when the record conforms.
    pub fn violations(&self, value: &Value) -> Vec<String> {
        let Some(object) = value.as_object() else {
            return vec!["record is not a JSON object".to_string()];
        };

        let mut violations = Vec::new();
        for rule in &self.fields {
            match object.get(rule.name) {
                None if rule.required => {
                    violations.push(format!("missing required field '{}'", rule.name))
                }
                None => {}
                Some(field) => check_field(rule, field, &mut violations),
            }
        }
        violations.extend(self.unknown_fields(object));
        violations
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.violations(value).is_empty()
    }

    fn unknown_fields(&self, object: &Map<String, Value>) -> Vec<String> {
        object
            .keys()
            .filter(|key| !self.fields.iter().any(|rule| rule.name == key.as_str()))
            .map(|key| format!("unexpected field '{key}'"))
            .collect()
    }
}

fn check_field(rule: &FieldRule, value: &Value, violations: &mut Vec<String>) {
    let name = rule.name;
    let type_ok = match rule.field_type {
        Text => value.is_string(),
        Integer => value.is_i64() || value.is_u64(),
        Boolean => value.is_boolean(),
        TextList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        NullableText => value.is_null() || value.is_string(),
        NullableInteger => value.is_null() || value.is_i64() || value.is_u64(),
    };
    if !type_ok {
        violations.push(format!("field '{name}' has the wrong type ({value})"));
        return;
    }

    if let Some(number) = value.as_i64() {
        if rule.minimum.is_some_and(|min| number < min) {
            violations.push(format!("field '{name}' is below the minimum ({number})"));
        }
        if rule.maximum.is_some_and(|max| number > max) {
            violations.push(format!("field '{name}' is above the maximum ({number})"));
        }
    } else if value.is_u64() && rule.maximum.is_some() {
        violations.push(format!("field '{name}' is above the maximum ({value})"));
    }

    if let Some(text) = value.as_str() {
        if rule.min_length.is_some_and(|min| text.chars().count() < min) {
            violations.push(format!("field '{name}' is too short"));
        }
        if rule.identifier && !is_valid_identifier(text) {
            violations.push(format!("field '{name}' is not a dotted numeric identifier ('{text}')"));
        }
        if rule.date_time && chrono::DateTime::parse_from_rfc3339(text).is_err() {
            violations.push(format!("field '{name}' is not an RFC 3339 timestamp ('{text}')"));
        }
    }
}

/// Per-file result of `validate_outputs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub path: PathBuf,
    pub lines: usize,
    pub problems: Vec<String>,
}

impl FileCheck {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputValidation {
    pub files: Vec<FileCheck>,
}

impl OutputValidation {
    pub fn is_valid(&self) -> bool {
        self.files.iter().all(FileCheck::is_valid)
    }

    pub fn problems(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(|f| {
                f.problems
                    .iter()
                    .map(move |p| format!("{}: {p}", f.path.display()))
            })
            .collect()
    }
}

/// Check the files in `dir` using the default file names.
pub fn validate_outputs(dir: &Path) -> OutputValidation {
    validate_outputs_with(dir, &OutputConfig::default())
}

/// Each JSONL file must exist, be non-empty, and hold one conforming JSON
/// object per line. The workbook must exist when reports are enabled.
pub fn validate_outputs_with(dir: &Path, config: &OutputConfig) -> OutputValidation {
    let mut files = vec![
        check_jsonl(&dir.join(&config.toc_file), RecordKind::Toc),
        check_jsonl(&dir.join(&config.spec_file), RecordKind::Section),
        check_jsonl(&dir.join(&config.metadata_file), RecordKind::Metadata),
    ];

    if config.generate_validation_report {
        let path = dir.join(&config.report_file);
        let problems = if path.exists() {
            Vec::new()
        } else {
            vec!["file is missing".to_string()]
        };
        files.push(FileCheck {
            path,
            lines: 0,
            problems,
        });
    }

    let validation = OutputValidation { files };
    if validation.is_valid() {
        info!(dir = %dir.display(), "all output files validated");
    } else {
        warn!(dir = %dir.display(), problems = validation.problems().len(), "output validation failed");
    }
    validation
}

fn check_jsonl(path: &Path, kind: RecordKind) -> FileCheck {
    let mut check = FileCheck {
        path: path.to_path_buf(),
        lines: 0,
        problems: Vec::new(),
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            check.problems.push("file is missing".to_string());
            return check;
        }
        Err(e) => {
            check.problems.push(format!("file is unreadable: {e}"));
            return check;
        }
    };

    let schema = RecordSchema::for_kind(kind);
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        check.lines += 1;
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                for violation in schema.violations(&value) {
                    check.problems.push(format!("line {}: {violation}", number + 1));
                }
            }
            Err(e) => check.problems.push(format!("line {}: invalid JSON: {e}", number + 1)),
        }
    }

    if check.lines == 0 {
        check.problems.push("file is empty".to_string());
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn toc_value() -> Value {
        json!({
            "doc_title": "USB PD",
            "section_id": "2.1",
            "title": "Introduction",
            "page": 53,
            "level": 2,
            "parent_id": "2",
            "full_path": "2.1 Introduction",
            "tags": []
        })
    }

    #[test]
    fn test_conforming_toc_record() {
        assert!(RecordSchema::for_kind(RecordKind::Toc).is_valid(&toc_value()));
    }

    #[test]
    fn test_level_above_maximum() {
        let mut value = toc_value();
        value["level"] = json!(6);
        let violations = RecordSchema::for_kind(RecordKind::Toc).violations(&value);
        assert_eq!(violations, vec!["field 'level' is above the maximum (6)"]);
    }

    #[test]
    fn test_missing_and_unexpected_fields() {
        let mut value = toc_value();
        let object = value.as_object_mut().unwrap();
        object.remove("full_path");
        object.insert("content".to_string(), json!("body"));

        let violations = RecordSchema::for_kind(RecordKind::Toc).violations(&value);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("full_path"));
        assert!(violations[1].contains("unexpected field 'content'"));
    }

    #[test]
    fn test_bad_identifier_and_types() {
        let mut value = toc_value();
        value["section_id"] = json!("A.1");
        value["page"] = json!("53");
        let violations = RecordSchema::for_kind(RecordKind::Toc).violations(&value);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_section_fields_allowed_only_on_sections() {
        let mut value = toc_value();
        value["content_end"] = Value::Null;
        value["word_count"] = json!(10);
        assert!(RecordSchema::for_kind(RecordKind::Section).is_valid(&value));
        assert!(!RecordSchema::for_kind(RecordKind::Toc).is_valid(&value));
    }

    #[test]
    fn test_metadata_timestamp_format() {
        let mut value = json!({
            "doc_title": "USB PD",
            "total_pages": 10,
            "total_sections": 0,
            "parsing_timestamp": "2024-05-01T10:00:00Z"
        });
        let schema = RecordSchema::for_kind(RecordKind::Metadata);
        assert!(schema.is_valid(&value));

        value["parsing_timestamp"] = json!("yesterday");
        assert!(!schema.is_valid(&value));
    }

    #[test]
    fn test_missing_directory_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let validation = validate_outputs(&dir.path().join("nope"));
        assert!(!validation.is_valid());
        assert_eq!(validation.files.len(), 4);
    }

    #[test]
    fn test_empty_and_invalid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            generate_validation_report: false,
            ..OutputConfig::default()
        };
        fs::write(dir.path().join(&config.toc_file), "").unwrap();
        fs::write(dir.path().join(&config.spec_file), "{not json}\n").unwrap();

        let validation = validate_outputs_with(dir.path(), &config);
        assert_eq!(validation.files[0].problems, vec!["file is empty"]);
        assert!(validation.files[1].problems[0].starts_with("line 1: invalid JSON"));
        assert_eq!(validation.files[2].problems, vec!["file is missing"]);
    }
}
