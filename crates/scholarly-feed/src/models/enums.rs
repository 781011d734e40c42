//! Enumeration types for store relationships and output.

use serde::{Deserialize, Serialize};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable Markdown format.
    #[default]
    Markdown,
    /// Machine-readable JSON format.
    Json,
}

/// User-to-paper relationship kept in a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// "liked" relationship.
    Like,
    /// "bookmarked" relationship.
    Bookmark,
}

impl RelationshipKind {
    /// Join table holding rows of this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Bookmark => "bookmarks",
        }
    }

    /// Counter column on the `papers` table.
    #[must_use]
    pub const fn counter_column(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Bookmark => "bookmarks",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Like => f.write_str("like"),
            Self::Bookmark => f.write_str("bookmark"),
        }
    }
}
