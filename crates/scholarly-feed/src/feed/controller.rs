//! Pagination and overlay state for one feed.
//!
//! The controller never performs I/O. Operations that need a fetch return a
//! [`FetchTicket`]; the caller runs the fetch and hands the result back to
//! [`FeedController::complete`]. At most one ticket is outstanding at a time.

use crate::error::SourceResult;
use crate::models::{Counters, FeedPage, FeedQuery, Paper, RelationshipKind};

/// Lifecycle of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// First page for the current query in flight.
    Loading,
    /// List is up to date.
    Ready,
    /// Next page in flight.
    LoadingMore,
    /// Last fetch failed; the list is left as it was.
    Error,
}

/// Which fetch a ticket stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page; replaces the list.
    Initial,
    /// Next page; appended to the list.
    More,
}

/// A fetch the controller wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,

    /// Built search query.
    pub query: String,

    /// Offset to request.
    pub offset: usize,

    /// Page size to request.
    pub page_size: usize,

    /// Initial or next page.
    pub kind: FetchKind,
}

/// Overlay change applied to a paper after a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayChange {
    /// Feed id of the paper.
    pub paper_id: String,

    /// Remote store key.
    pub arxiv_id: String,

    /// Relationship that changed.
    pub kind: RelationshipKind,

    /// New state of the relationship.
    pub active: bool,
}

/// Feed list, cursor and loading state.
#[derive(Debug, Clone)]
pub struct FeedController {
    query: FeedQuery,
    papers: Vec<Paper>,
    cursor: usize,
    has_more: bool,
    status: FeedStatus,
    page_size: usize,
    generation: u64,
    in_flight: bool,
    initial_loaded: bool,
    focus: usize,
    last_error: Option<String>,
}

impl FeedController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            query: FeedQuery::default(),
            papers: Vec::new(),
            cursor: 0,
            has_more: true,
            status: FeedStatus::Idle,
            page_size,
            generation: 0,
            in_flight: false,
            initial_loaded: false,
            focus: 0,
            last_error: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Papers in feed order.
    #[must_use]
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Look up a paper by feed id.
    #[must_use]
    pub fn paper(&self, paper_id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == paper_id)
    }

    /// Current query selection.
    #[must_use]
    pub const fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> FeedStatus {
        self.status
    }

    /// Offset of the next page.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether another page may exist.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Message of the last failed fetch, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Index of the focused card.
    #[must_use]
    pub const fn focus(&self) -> usize {
        self.focus
    }

    /// The focused paper.
    #[must_use]
    pub fn focused_paper(&self) -> Option<&Paper> {
        self.papers.get(self.focus)
    }

    // ========================================================================
    // Fetch triggers
    // ========================================================================

    /// Request the first page for the current query.
    pub fn start(&mut self) -> Option<FetchTicket> {
        if self.in_flight {
            return None;
        }
        self.begin_initial()
    }

    /// Replace the query. Returns a ticket unless the query is unchanged or
    /// a fetch is already in flight, in which case the reload is issued when
    /// that fetch completes.
    pub fn set_query(&mut self, query: FeedQuery) -> Option<FetchTicket> {
        if query == self.query && self.status != FeedStatus::Idle {
            return None;
        }
        self.query = query;
        self.reset()
    }

    /// Replace the search text.
    pub fn set_search_text(&mut self, text: &str) -> Option<FetchTicket> {
        let query = FeedQuery { text: text.to_string(), ..self.query.clone() };
        self.set_query(query)
    }

    /// Select or deselect a category chip.
    pub fn toggle_category(&mut self, category: &str) -> Option<FetchTicket> {
        let mut query = self.query.clone();
        query.toggle_category(category);
        self.set_query(query)
    }

    /// Reload the current query from the first page.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.reset()
    }

    /// Viewport report: load more once the last visible card is within one
    /// of the end of the list.
    pub fn on_viewport(&mut self, last_visible: usize) -> Option<FetchTicket> {
        if !self.initial_loaded || last_visible.saturating_add(2) < self.papers.len() {
            return None;
        }
        self.load_more()
    }

    /// Request the next page.
    ///
    /// Falls back to the first page until one has loaded for this query. A
    /// loaded first page that kept no papers still pages forward.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.in_flight || !self.has_more {
            return None;
        }
        if !self.initial_loaded {
            return self.begin_initial();
        }

        self.in_flight = true;
        self.status = FeedStatus::LoadingMore;
        Some(self.ticket(FetchKind::More, self.cursor))
    }

    /// Apply a fetch result. Returns a follow-up ticket when the query
    /// changed while the fetch was in flight.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: SourceResult<FeedPage>,
    ) -> Option<FetchTicket> {
        if !self.in_flight {
            tracing::debug!(offset = ticket.offset, "Ignoring completion with nothing in flight");
            return None;
        }
        self.in_flight = false;

        if ticket.generation != self.generation {
            tracing::debug!(stale_query = %ticket.query, "Query changed during fetch; reloading");
            return self.begin_initial();
        }

        match result {
            Ok(page) => {
                match ticket.kind {
                    FetchKind::Initial => {
                        self.papers = page.papers;
                        self.cursor = ticket.page_size;
                        self.focus = 0;
                        self.initial_loaded = true;
                    }
                    FetchKind::More => {
                        self.papers.extend(page.papers);
                        self.cursor += ticket.page_size;
                    }
                }
                self.has_more = page.has_more;
                self.status = FeedStatus::Ready;
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(query = %ticket.query, offset = ticket.offset, error = %e, "Feed fetch failed");
                self.status = FeedStatus::Error;
                self.last_error = Some(e.to_string());
            }
        }
        None
    }

    fn reset(&mut self) -> Option<FetchTicket> {
        self.generation += 1;
        self.initial_loaded = false;
        self.papers.clear();
        self.cursor = 0;
        self.has_more = true;
        self.focus = 0;
        self.status = FeedStatus::Loading;

        if self.in_flight {
            return None;
        }
        self.begin_initial()
    }

    fn begin_initial(&mut self) -> Option<FetchTicket> {
        self.in_flight = true;
        self.status = FeedStatus::Loading;
        Some(self.ticket(FetchKind::Initial, 0))
    }

    fn ticket(&self, kind: FetchKind, offset: usize) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            query: self.query.to_query_string(),
            offset,
            page_size: self.page_size,
            kind,
        }
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Focus the next card, stopping at the last one.
    pub fn focus_next(&mut self) -> usize {
        if self.focus + 1 < self.papers.len() {
            self.focus += 1;
        }
        self.focus
    }

    /// Focus the previous card, stopping at the first one.
    pub fn focus_previous(&mut self) -> usize {
        self.focus = self.focus.saturating_sub(1);
        self.focus
    }

    // ========================================================================
    // Overlay
    // ========================================================================

    /// Flip the like on a paper.
    pub fn toggle_like(&mut self, paper_id: &str) -> Option<OverlayChange> {
        self.toggle(RelationshipKind::Like, paper_id)
    }

    /// Flip the bookmark on a paper.
    pub fn toggle_bookmark(&mut self, paper_id: &str) -> Option<OverlayChange> {
        self.toggle(RelationshipKind::Bookmark, paper_id)
    }

    /// Force the like flag, adjusting the counter if it changes.
    pub fn set_like(&mut self, paper_id: &str, liked: bool) -> Option<OverlayChange> {
        self.set(RelationshipKind::Like, paper_id, liked)
    }

    /// Force the bookmark flag, adjusting the counter if it changes.
    pub fn set_bookmark(&mut self, paper_id: &str, bookmarked: bool) -> Option<OverlayChange> {
        self.set(RelationshipKind::Bookmark, paper_id, bookmarked)
    }

    /// Overwrite the overlay of every card showing `arxiv_id` with remote
    /// truth.
    pub fn reconcile(
        &mut self,
        arxiv_id: &str,
        liked: bool,
        bookmarked: bool,
        counters: Option<Counters>,
    ) {
        for paper in self.papers.iter_mut().filter(|p| p.arxiv_id == arxiv_id) {
            paper.is_liked_by_user = liked;
            paper.bookmarked = bookmarked;
            if let Some(counters) = counters {
                paper.likes = counters.likes;
                paper.bookmarks = counters.bookmarks;
            }
        }
    }

    fn toggle(&mut self, kind: RelationshipKind, paper_id: &str) -> Option<OverlayChange> {
        let current = flag(self.paper(paper_id)?, kind);
        self.set(kind, paper_id, !current)
    }

    fn set(&mut self, kind: RelationshipKind, paper_id: &str, active: bool) -> Option<OverlayChange> {
        let paper = self.papers.iter_mut().find(|p| p.id == paper_id)?;

        if flag(paper, kind) != active {
            let mut counters = Counters { likes: paper.likes, bookmarks: paper.bookmarks };
            if active {
                counters.increment(kind);
            } else {
                counters.decrement(kind);
            }
            paper.likes = counters.likes;
            paper.bookmarks = counters.bookmarks;
            match kind {
                RelationshipKind::Like => paper.is_liked_by_user = active,
                RelationshipKind::Bookmark => paper.bookmarked = active,
            }
        }

        Some(OverlayChange {
            paper_id: paper.id.clone(),
            arxiv_id: paper.arxiv_id.clone(),
            kind,
            active,
        })
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(crate::config::feed::PAGE_SIZE)
    }
}

const fn flag(paper: &Paper, kind: RelationshipKind) -> bool {
    match kind {
        RelationshipKind::Like => paper.is_liked_by_user,
        RelationshipKind::Bookmark => paper.bookmarked,
    }
}
