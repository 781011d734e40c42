//! Normalized paper record shown on feed cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author placeholder when an entry lists no usable names.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Category placeholder when an entry carries no category terms.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A paper as loaded into the feed.
///
/// Bibliographic fields are fixed once the source adapter builds the record.
/// The counters and the two user flags form an overlay that only the feed
/// controller changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Feed identity, unique within a loaded page.
    pub id: String,

    /// arXiv identifier used as the key in the remote store.
    pub arxiv_id: String,

    /// Title with entities decoded and whitespace collapsed.
    pub title: String,

    /// Abstract with entities decoded and whitespace collapsed.
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Ordered author display names, never empty.
    pub authors: Vec<String>,

    /// Publication year.
    pub year: i32,

    /// Publication timestamp.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,

    /// Last revision timestamp.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,

    /// Deduplicated topic tags, primary category first.
    pub categories: Vec<String>,

    /// Landing page, PDF and DOI links.
    #[serde(default)]
    pub links: PaperLinks,

    /// Like counter mirrored from the remote store.
    #[serde(default)]
    pub likes: u32,

    /// Bookmark counter mirrored from the remote store.
    #[serde(default)]
    pub bookmarks: u32,

    /// Whether the signed-in user liked this paper.
    #[serde(default)]
    pub is_liked_by_user: bool,

    /// Whether the signed-in user bookmarked this paper.
    #[serde(default)]
    pub bookmarked: bool,
}

/// External links for a paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperLinks {
    /// PDF download.
    #[serde(default)]
    pub pdf: Option<String>,

    /// HTML abstract page.
    #[serde(default)]
    pub html: Option<String>,

    /// DOI, when arXiv knows one.
    #[serde(default)]
    pub doi: Option<String>,
}

impl Paper {
    /// Author line for compact cards: "First et al." beyond two authors.
    #[must_use]
    pub fn author_line(&self) -> String {
        if self.authors.len() > 2 {
            format!("{} et al.", self.authors[0])
        } else {
            self.authors.join(", ")
        }
    }

    /// URL for the external "read" action: HTML page, else PDF.
    #[must_use]
    pub fn read_url(&self) -> Option<&str> {
        self.links.html.as_deref().or(self.links.pdf.as_deref())
    }
}

#[cfg(test)]
impl Paper {
    /// Minimal paper for unit tests.
    pub(crate) fn fixture(id: &str) -> Self {
        Self {
            id: id.to_string(),
            arxiv_id: id.to_string(),
            title: format!("Paper {id}"),
            abstract_text: "Abstract".to_string(),
            authors: vec![UNKNOWN_AUTHOR.to_string()],
            year: 2024,
            published: None,
            updated: None,
            categories: vec!["cs.AI".to_string()],
            links: PaperLinks::default(),
            likes: 0,
            bookmarks: 0,
            is_liked_by_user: false,
            bookmarked: false,
        }
    }
}
