// Pipeline components, in dependency order:
// - page_classifier.rs: picks outline candidate pages
// - line_matcher.rs: priority-ordered heading patterns
// - tagging.rs: vocabulary and category tags from titles
// - hierarchy.rs: numeric ordering and parent links
// - section_spanner.rs: page spans and content statistics
// - consistency.rs: outline vs. section discrepancy report
// - title.rs: document title lookup

pub mod consistency;
pub mod hierarchy;
pub mod line_matcher;
pub mod page_classifier;
pub mod section_spanner;
pub mod tagging;
pub mod title;

pub use consistency::{
    ComparisonRow, ComparisonStatus, ConsistencyValidator, DiscrepancyReport, DiscrepancySummary,
};
pub use hierarchy::HierarchyBuilder;
pub use line_matcher::LineMatcher;
pub use page_classifier::PageClassifier;
pub use section_spanner::SectionSpanner;
pub use tagging::TagGenerator;
pub use title::TitleExtractor;
