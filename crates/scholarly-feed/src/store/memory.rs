//! In-process store for tests and offline use.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RemoteStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Counters, Paper, PaperRow, RelationshipKind, User};

#[derive(Debug, Default)]
struct State {
    user: Option<User>,
    papers: HashMap<String, PaperRow>,
    relationships: HashSet<(RelationshipKind, String, String)>,
    fail_writes: bool,
}

/// Store kept in memory behind a single lock, so each operation is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with `user` signed in.
    #[must_use]
    pub fn with_user(user: User) -> Self {
        let state = State { user: Some(user), ..State::default() };
        Self { state: Arc::new(RwLock::new(state)) }
    }

    /// Make every subsequent write fail.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    /// Stored row for a paper.
    pub async fn paper_row(&self, arxiv_id: &str) -> Option<PaperRow> {
        self.state.read().await.papers.get(arxiv_id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn current_user(&self) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.user.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        let user = User { id: format!("user-{email}"), email: Some(email.to_string()) };
        self.state.write().await.user = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> StoreResult<User> {
        self.sign_in_with_password(email, password).await
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.state.write().await.user = None;
        Ok(())
    }

    async fn add_relationship(&self, kind: RelationshipKind, paper: &Paper) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
            tracing::info!(%kind, arxiv_id = %paper.arxiv_id, "No session; skipping add");
            return Ok(());
        };
        if state.fail_writes {
            return Err(StoreError::unexpected("add relationship", "writes disabled"));
        }

        let key = (kind, user_id, paper.arxiv_id.clone());
        if state.relationships.contains(&key) {
            return Ok(());
        }

        state
            .papers
            .entry(paper.arxiv_id.clone())
            .and_modify(|row| {
                let mut counters = row.counters();
                counters.increment(kind);
                row.likes = i64::from(counters.likes);
                row.bookmarks = i64::from(counters.bookmarks);
            })
            .or_insert_with(|| PaperRow::from_paper(paper, Counters::seeded(kind)));
        state.relationships.insert(key);
        Ok(())
    }

    async fn remove_relationship(
        &self,
        kind: RelationshipKind,
        arxiv_id: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
            tracing::info!(%kind, arxiv_id, "No session; skipping remove");
            return Ok(());
        };
        if state.fail_writes {
            return Err(StoreError::unexpected("remove relationship", "writes disabled"));
        }

        if !state.relationships.remove(&(kind, user_id, arxiv_id.to_string())) {
            return Ok(());
        }
        if let Some(row) = state.papers.get_mut(arxiv_id) {
            let mut counters = row.counters();
            counters.decrement(kind);
            row.likes = i64::from(counters.likes);
            row.bookmarks = i64::from(counters.bookmarks);
        }
        Ok(())
    }

    async fn has_relationship(&self, kind: RelationshipKind, arxiv_id: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.user.as_ref().is_some_and(|u| {
            state.relationships.contains(&(kind, u.id.clone(), arxiv_id.to_string()))
        }))
    }

    async fn counters(&self, arxiv_ids: &[String]) -> StoreResult<HashMap<String, Counters>> {
        let state = self.state.read().await;
        Ok(arxiv_ids
            .iter()
            .filter_map(|id| state.papers.get(id).map(|row| (id.clone(), row.counters())))
            .collect())
    }

    async fn popular_papers(&self, limit: usize) -> StoreResult<Vec<Paper>> {
        let state = self.state.read().await;
        let mut rows: Vec<&PaperRow> = state.papers.values().collect();
        rows.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.arxiv_id.cmp(&b.arxiv_id)));
        Ok(rows.into_iter().take(limit).cloned().map(PaperRow::into_paper).collect())
    }

    async fn bookmarked_papers(&self) -> StoreResult<Vec<Paper>> {
        let state = self.state.read().await;
        let Some(user) = state.user.as_ref() else {
            return Ok(Vec::new());
        };

        let mut papers: Vec<Paper> = state
            .relationships
            .iter()
            .filter(|(kind, owner, _)| *kind == RelationshipKind::Bookmark && *owner == user.id)
            .filter_map(|(_, _, arxiv_id)| state.papers.get(arxiv_id).cloned())
            .map(|row| Paper { bookmarked: true, ..row.into_paper() })
            .collect();
        papers.sort_by(|a, b| a.arxiv_id.cmp(&b.arxiv_id));
        Ok(papers)
    }
}
