//! Tag model and name normalization.
//!
//! # Invariants
//! - Persisted tag names are trimmed and lowercase.
//! - Tag names are unique case-insensitively.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Row id of a tag.
pub type TagId = i64;

/// User-defined label applicable to many items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Tag read model with the number of items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    pub tag: Tag,
    pub item_count: u32,
}

/// Normalizes one tag value. Returns `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values, dropping blanks. Output is sorted.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, normalize_tags};

    #[test]
    fn normalize_tags_dedupes_case_insensitively() {
        let tags = vec![
            "Tools".to_string(),
            " tools ".to_string(),
            "Camping".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["camping", "tools"]);
    }

    #[test]
    fn normalize_tag_rejects_blank() {
        assert_eq!(normalize_tag("  \t"), None);
        assert_eq!(normalize_tag(" Winter "), Some("winter".to_string()));
    }
}
