//! Async driver wiring the feed controller to a paper source and a store.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Mutex, MutexGuard};

use super::controller::{FeedController, FetchTicket, OverlayChange};
use super::debounce::Debouncer;
use crate::client::PaperSource;
use crate::config::Config;
use crate::error::StoreResult;
use crate::interaction::{Action, HapticSink, InteractionDispatcher};
use crate::models::{FeedQuery, Paper, RelationshipKind};
use crate::store::RemoteStore;

/// Paper handed to the chat screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHandoff {
    /// Feed id of the paper.
    pub paper_id: String,

    /// Paper title.
    pub title: String,
}

/// One user's feed: state, gesture handling and remote persistence.
///
/// Source and store errors stop here; they are logged and the feed keeps
/// its previous state.
pub struct FeedSession<S, R: ?Sized> {
    controller: Mutex<FeedController>,
    dispatcher: Mutex<InteractionDispatcher>,
    debouncer: Mutex<Debouncer>,
    source: Arc<S>,
    store: Arc<R>,
}

impl<S, R> FeedSession<S, R>
where
    S: PaperSource,
    R: RemoteStore + ?Sized,
{
    /// Create a session.
    #[must_use]
    pub fn new(config: &Config, source: Arc<S>, store: Arc<R>, haptics: Arc<dyn HapticSink>) -> Self {
        Self {
            controller: Mutex::new(FeedController::new(config.page_size)),
            dispatcher: Mutex::new(InteractionDispatcher::new(config.gestures, haptics)),
            debouncer: Mutex::new(Debouncer::new(config.search_debounce)),
            source,
            store,
        }
    }

    /// Lock the controller to read feed state.
    pub async fn controller(&self) -> MutexGuard<'_, FeedController> {
        self.controller.lock().await
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Load the first page.
    pub async fn start(&self) {
        let ticket = self.controller.lock().await.start();
        self.run(ticket).await;
    }

    /// Reload the current query.
    pub async fn refresh(&self) {
        let ticket = self.controller.lock().await.refresh();
        self.reset_cards().await;
        self.run(ticket).await;
    }

    /// Register a keystroke. Waits out the debounce window and applies the
    /// text only if no later keystroke arrived meanwhile.
    pub async fn set_search_text(&self, text: &str) {
        let deadline = self.debouncer.lock().await.push(text, Instant::now());
        tokio::time::sleep_until(deadline.into()).await;

        let Some(text) = self.debouncer.lock().await.poll(Instant::now()) else {
            return;
        };
        tracing::debug!(%text, "Search text settled");
        let ticket = self.controller.lock().await.set_search_text(&text);
        if ticket.is_some() {
            self.reset_cards().await;
        }
        self.run(ticket).await;
    }

    /// Replace text and categories at once with a single fetch.
    pub async fn set_query(&self, query: FeedQuery) {
        let ticket = self.controller.lock().await.set_query(query);
        if ticket.is_some() {
            self.reset_cards().await;
        }
        self.run(ticket).await;
    }

    /// Select or deselect a category chip.
    pub async fn toggle_category(&self, category: &str) {
        let ticket = self.controller.lock().await.toggle_category(category);
        self.reset_cards().await;
        self.run(ticket).await;
    }

    /// Viewport report from the list view.
    pub async fn on_viewport(&self, last_visible: usize) {
        let ticket = self.controller.lock().await.on_viewport(last_visible);
        self.run(ticket).await;
    }

    /// Request the next page explicitly.
    pub async fn load_more(&self) {
        let ticket = self.controller.lock().await.load_more();
        self.run(ticket).await;
    }

    /// Perform tickets until the controller stops asking for more.
    async fn run(&self, mut ticket: Option<FetchTicket>) {
        while let Some(current) = ticket {
            let result = self.source.search(&current.query, current.offset, current.page_size).await;
            let fetched: Vec<String> = result
                .as_ref()
                .map(|page| page.papers.iter().map(|p| p.arxiv_id.clone()).collect())
                .unwrap_or_default();

            ticket = self.controller.lock().await.complete(&current, result);
            if !fetched.is_empty() {
                self.reconcile(&fetched).await;
            }
        }
    }

    async fn reset_cards(&self) {
        self.dispatcher.lock().await.clear();
    }

    // ========================================================================
    // Gestures
    // ========================================================================

    /// Live drag update on a card.
    pub async fn handle_drag(&self, paper_id: &str, dx: f32, dy: f32) {
        self.dispatcher.lock().await.on_drag(paper_id, dx, dy);
    }

    /// Drag released on a card.
    pub async fn handle_release(&self, paper_id: &str, dx: f32, dy: f32) -> Option<ChatHandoff> {
        let action = self.dispatcher.lock().await.on_release(paper_id, dx, dy)?;
        self.dispatch(action).await
    }

    /// Tap on a card at `now`.
    pub async fn handle_tap(&self, paper_id: &str, now: Instant) -> Option<ChatHandoff> {
        let action = self.dispatcher.lock().await.on_tap(paper_id, now)?;
        self.dispatch(action).await
    }

    /// A card is back in view (returning from chat).
    pub async fn on_card_visible(&self, paper_id: &str) {
        self.dispatcher.lock().await.on_card_visible(paper_id);
    }

    /// Carry out an action. Returns the chat handoff for [`Action::OpenChat`].
    pub async fn dispatch(&self, action: Action) -> Option<ChatHandoff> {
        match action {
            Action::ToggleBookmark { paper_id } => {
                let change = self.controller.lock().await.toggle_bookmark(&paper_id);
                self.persist(change).await;
                None
            }
            Action::ToggleLike { paper_id } => {
                let change = self.controller.lock().await.toggle_like(&paper_id);
                self.persist(change).await;
                None
            }
            Action::OpenChat { paper_id } => {
                let controller = self.controller.lock().await;
                let paper = controller.paper(&paper_id)?;
                Some(ChatHandoff { paper_id: paper.id.clone(), title: paper.title.clone() })
            }
            Action::FocusNext => {
                let (focused, ticket) = {
                    let mut controller = self.controller.lock().await;
                    let index = controller.focus_next();
                    let focused = controller.focused_paper().map(|p| p.id.clone());
                    (focused, controller.on_viewport(index))
                };
                if let Some(id) = focused {
                    self.on_card_visible(&id).await;
                }
                self.run(ticket).await;
                None
            }
            Action::FocusPrevious => {
                let focused = {
                    let mut controller = self.controller.lock().await;
                    controller.focus_previous();
                    controller.focused_paper().map(|p| p.id.clone())
                };
                if let Some(id) = focused {
                    self.on_card_visible(&id).await;
                }
                None
            }
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write an overlay change through; roll it back if the store fails.
    async fn persist(&self, change: Option<OverlayChange>) {
        let Some(change) = change else {
            return;
        };
        let paper = {
            let controller = self.controller.lock().await;
            match controller.paper(&change.paper_id) {
                Some(paper) => paper.clone(),
                None => return,
            }
        };

        let result = match (change.kind, change.active) {
            (RelationshipKind::Like, true) => self.store.add_like(&paper).await,
            (RelationshipKind::Like, false) => self.store.remove_like(&change.arxiv_id).await,
            (RelationshipKind::Bookmark, true) => self.store.add_bookmark(&paper).await,
            (RelationshipKind::Bookmark, false) => {
                self.store.remove_bookmark(&change.arxiv_id).await
            }
        };

        if let Err(e) = result {
            tracing::warn!(
                kind = %change.kind,
                arxiv_id = %change.arxiv_id,
                error = %e,
                "Store write failed; rolling back"
            );
            let mut controller = self.controller.lock().await;
            match change.kind {
                RelationshipKind::Like => controller.set_like(&change.paper_id, !change.active),
                RelationshipKind::Bookmark => {
                    controller.set_bookmark(&change.paper_id, !change.active)
                }
            };
        }
    }

    /// Rebuild the like/bookmark overlay of every loaded paper from the store.
    pub async fn refresh_relationships(&self) {
        let ids: Vec<String> =
            self.controller.lock().await.papers().iter().map(|p| p.arxiv_id.clone()).collect();
        self.reconcile(&ids).await;
    }

    async fn reconcile(&self, arxiv_ids: &[String]) {
        let counters = match self.store.counters(arxiv_ids).await {
            Ok(counters) => counters,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load counters");
                return;
            }
        };

        let mut lookups: FuturesUnordered<_> = arxiv_ids
            .iter()
            .map(|arxiv_id| async move { (arxiv_id, self.relationship_flags(arxiv_id).await) })
            .collect();

        while let Some((arxiv_id, flags)) = lookups.next().await {
            let (liked, bookmarked) = match flags {
                Ok(flags) => flags,
                Err(e) => {
                    tracing::warn!(%arxiv_id, error = %e, "Could not load relationship state");
                    continue;
                }
            };
            self.controller.lock().await.reconcile(
                arxiv_id,
                liked,
                bookmarked,
                counters.get(arxiv_id).copied(),
            );
        }
    }

    async fn relationship_flags(&self, arxiv_id: &str) -> StoreResult<(bool, bool)> {
        futures::try_join!(self.store.is_liked(arxiv_id), self.store.is_bookmarked(arxiv_id))
    }

    /// Papers currently loaded, for rendering.
    pub async fn papers(&self) -> Vec<Paper> {
        self.controller.lock().await.papers().to_vec()
    }
}

impl<S, R: ?Sized> std::fmt::Debug for FeedSession<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession").finish_non_exhaustive()
    }
}
