use crate::config::{CategoryRule, TaggingConfig};

// TagGenerator - derives tags from heading titles
pub struct TagGenerator {
    vocabulary: Vec<String>,
    categories: Vec<CategoryRule>,
}

impl TagGenerator {
    pub fn new(config: &TaggingConfig) -> Self {
        Self {
            vocabulary: config.vocabulary.iter().map(|t| t.to_lowercase()).collect(),
            categories: config.categories.clone(),
        }
    }

    /// Vocabulary terms found in the title, in vocabulary order, then at most one
    /// category tag from the first rule with a keyword in the title.
    pub fn tags_for(&self, title: &str) -> Vec<String> {
        let lower = title.to_lowercase();

        let mut tags: Vec<String> = Vec::new();
        for term in &self.vocabulary {
            if lower.contains(term.as_str()) && !tags.contains(term) {
                tags.push(term.clone());
            }
        }

        let category = self.categories.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|k| lower.contains(k.to_lowercase().as_str()))
        });
        if let Some(rule) = category {
            if !tags.contains(&rule.tag) {
                tags.push(rule.tag.clone());
            }
        }

        tags
    }
}
