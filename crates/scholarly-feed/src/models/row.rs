//! Rows exchanged with the remote persistence backend.

use serde::{Deserialize, Serialize};

use super::{Paper, PaperLinks, RelationshipKind};

/// A row of the remote `papers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRow {
    /// Row id (the arXiv id).
    pub id: String,

    /// Paper title.
    #[serde(default)]
    pub title: String,

    /// Paper abstract.
    #[serde(default)]
    pub r#abstract: String,

    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year.
    #[serde(default)]
    pub year: i32,

    /// arXiv identifier.
    pub arxiv_id: String,

    /// Category tags.
    #[serde(default)]
    pub categories: Vec<String>,

    /// PDF link.
    #[serde(default)]
    pub pdf_url: Option<String>,

    /// HTML link.
    #[serde(default)]
    pub html_url: Option<String>,

    /// DOI.
    #[serde(default)]
    pub doi: Option<String>,

    /// Like counter.
    #[serde(default)]
    pub likes: i64,

    /// Bookmark counter.
    #[serde(default)]
    pub bookmarks: i64,
}

impl PaperRow {
    /// Build a row for a paper with explicit counter values.
    #[must_use]
    pub fn from_paper(paper: &Paper, counters: Counters) -> Self {
        Self {
            id: paper.arxiv_id.clone(),
            title: paper.title.clone(),
            r#abstract: paper.abstract_text.clone(),
            authors: paper.authors.clone(),
            year: paper.year,
            arxiv_id: paper.arxiv_id.clone(),
            categories: paper.categories.clone(),
            pdf_url: paper.links.pdf.clone(),
            html_url: paper.links.html.clone(),
            doi: paper.links.doi.clone(),
            likes: i64::from(counters.likes),
            bookmarks: i64::from(counters.bookmarks),
        }
    }

    /// Counters clamped into the non-negative range.
    #[must_use]
    pub fn counters(&self) -> Counters {
        Counters {
            likes: u32::try_from(self.likes.max(0)).unwrap_or(u32::MAX),
            bookmarks: u32::try_from(self.bookmarks.max(0)).unwrap_or(u32::MAX),
        }
    }

    /// Convert a stored row back into a feed paper (library and trending views).
    #[must_use]
    pub fn into_paper(self) -> Paper {
        let counters = self.counters();
        Paper {
            id: self.arxiv_id.clone(),
            arxiv_id: self.arxiv_id,
            title: self.title,
            abstract_text: self.r#abstract,
            authors: self.authors,
            year: self.year,
            published: None,
            updated: None,
            categories: self.categories,
            links: PaperLinks { pdf: self.pdf_url, html: self.html_url, doi: self.doi },
            likes: counters.likes,
            bookmarks: counters.bookmarks,
            is_liked_by_user: false,
            bookmarked: false,
        }
    }
}

/// A row of a `likes` or `bookmarks` join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRow {
    /// Owning user.
    pub user_id: String,

    /// Row id in `papers`.
    pub paper_id: String,
}

/// Like and bookmark counters for one paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Number of likes.
    pub likes: u32,

    /// Number of bookmarks.
    pub bookmarks: u32,
}

impl Counters {
    /// Seed counters for a paper stored because of its first relationship.
    #[must_use]
    pub const fn seeded(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::Like => Self { likes: 1, bookmarks: 0 },
            RelationshipKind::Bookmark => Self { likes: 0, bookmarks: 1 },
        }
    }

    /// Counter value for the given relationship.
    #[must_use]
    pub const fn get(self, kind: RelationshipKind) -> u32 {
        match kind {
            RelationshipKind::Like => self.likes,
            RelationshipKind::Bookmark => self.bookmarks,
        }
    }

    /// Increment the counter for the given relationship.
    pub fn increment(&mut self, kind: RelationshipKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(1);
    }

    /// Decrement the counter for the given relationship, clamped at zero.
    pub fn decrement(&mut self, kind: RelationshipKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(1);
    }

    fn slot(&mut self, kind: RelationshipKind) -> &mut u32 {
        match kind {
            RelationshipKind::Like => &mut self.likes,
            RelationshipKind::Bookmark => &mut self.bookmarks,
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user id.
    pub id: String,

    /// Email, when the auth provider exposes it.
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut counters = Counters::default();
        counters.decrement(RelationshipKind::Like);
        assert_eq!(counters.likes, 0);
    }

    #[test]
    fn test_seeded_counters() {
        assert_eq!(Counters::seeded(RelationshipKind::Like), Counters { likes: 1, bookmarks: 0 });
        assert_eq!(
            Counters::seeded(RelationshipKind::Bookmark),
            Counters { likes: 0, bookmarks: 1 }
        );
    }

    #[test]
    fn test_negative_row_counters_clamp() {
        let json = r#"{"id":"x","arxiv_id":"x","likes":-3,"bookmarks":2}"#;
        let row: PaperRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.counters(), Counters { likes: 0, bookmarks: 2 });
    }

    #[test]
    fn test_row_round_trips_into_paper() {
        let paper = Paper::fixture("2401.00002");
        let row = PaperRow::from_paper(&paper, Counters::seeded(RelationshipKind::Bookmark));
        let back = row.into_paper();
        assert_eq!(back.arxiv_id, "2401.00002");
        assert_eq!(back.bookmarks, 1);
        assert_eq!(back.likes, 0);
    }
}
