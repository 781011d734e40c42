//! Feed query and page values.

use serde::{Deserialize, Serialize};

use super::Paper;

/// What the user is currently asking the feed for.
///
/// Recomputed on every keystroke or chip toggle and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Free-text search term.
    #[serde(default)]
    pub text: String,

    /// Selected category ids in selection order.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl FeedQuery {
    /// Create a query from text and categories.
    #[must_use]
    pub fn new(text: impl Into<String>, categories: Vec<String>) -> Self {
        Self { text: text.into(), categories }
    }

    /// Select the category if absent, deselect it if present.
    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.categories.iter().position(|c| c == category) {
            self.categories.remove(pos);
        } else {
            self.categories.push(category.to_string());
        }
    }

    /// Check if neither text nor categories are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.categories.is_empty()
    }

    /// The search-engine query string for this selection.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        crate::query::build(&self.text, &self.categories)
    }
}

/// One fetched page of papers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    /// Papers in source order.
    pub papers: Vec<Paper>,

    /// Offset the page was requested at.
    pub offset: usize,

    /// Whether another page is likely to exist.
    pub has_more: bool,
}

impl FeedPage {
    /// Number of papers in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    /// Check if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_category_preserves_selection_order() {
        let mut query = FeedQuery::default();
        query.toggle_category("cs.RO");
        query.toggle_category("cs.AI");
        assert_eq!(query.categories, vec!["cs.RO", "cs.AI"]);

        query.toggle_category("cs.RO");
        assert_eq!(query.categories, vec!["cs.AI"]);
    }

    #[test]
    fn test_whitespace_query_is_empty() {
        assert!(FeedQuery::new("   ", vec![]).is_empty());
        assert!(!FeedQuery::new("", vec!["cs.AI".to_string()]).is_empty());
    }
}
