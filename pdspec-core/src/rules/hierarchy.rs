use crate::types::{
    is_valid_identifier, level_of, parent_identifier, OutlineEntry, StageOutput, StageWarning,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Numeric sort key for a dotted identifier. Malformed identifiers map to `[0]`
/// so they sort ahead of every well-formed one.
pub fn sort_key(identifier: &str) -> Vec<u64> {
    if !is_valid_identifier(identifier) {
        return vec![0];
    }
    identifier
        .split('.')
        .map(|part| part.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|_| vec![0])
}

// HierarchyBuilder - orders raw entries and links each one to its parent
#[derive(Debug, Default)]
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Sort, drop duplicate identifiers, recompute levels, and resolve parents.
    pub fn build(&self, mut entries: Vec<OutlineEntry>) -> StageOutput<Vec<OutlineEntry>> {
        let mut warnings = Vec::new();

        // stable: duplicates keep insertion order
        entries.sort_by_cached_key(|e| sort_key(&e.identifier));

        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(entries.len());
        for entry in entries {
            if seen.insert(entry.identifier.clone()) {
                ordered.push(entry);
            } else {
                warn!(identifier = %entry.identifier, page = entry.page, "duplicate identifier rejected");
                warnings.push(StageWarning::DuplicateIdentifier {
                    identifier: entry.identifier,
                    page: entry.page,
                });
            }
        }

        for entry in &mut ordered {
            entry.level = level_of(&entry.identifier);
            entry.parent = None;

            let Some(parent) = parent_identifier(&entry.identifier) else {
                continue;
            };
            if seen.contains(parent) {
                entry.parent = Some(parent.to_string());
            } else {
                debug!(identifier = %entry.identifier, parent, "parent not found");
                warnings.push(StageWarning::OrphanedEntry {
                    identifier: entry.identifier.clone(),
                    parent: parent.to_string(),
                });
            }
        }

        StageOutput::with_warnings(ordered, warnings)
    }
}
