//! Like and bookmark persistence.
//!
//! Every operation needs a signed-in user. Without one, writes are logged
//! no-ops and existence checks answer `false`; callers never see
//! [`StoreError::Unauthenticated`](crate::error::StoreError::Unauthenticated)
//! from these methods.
//!
//! Adds are idempotent: adding an existing relationship leaves the counter
//! alone. When the relationship insert fails after the counter was bumped,
//! the counter is reverted.

mod memory;
mod supabase;

use std::collections::HashMap;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use crate::error::StoreResult;
use crate::models::{Counters, Paper, RelationshipKind, User};

/// Remote like/bookmark backend keyed by arXiv id.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Signed-in user, if any.
    async fn current_user(&self) -> StoreResult<Option<User>>;

    /// Start a session with email and password.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<User>;

    /// Register an account. A session starts right away unless the backend
    /// holds the account for email confirmation.
    async fn sign_up(&self, email: &str, password: &str) -> StoreResult<User>;

    /// End the current session.
    async fn sign_out(&self) -> StoreResult<()>;

    /// Record a relationship, creating the paper row if needed.
    async fn add_relationship(&self, kind: RelationshipKind, paper: &Paper) -> StoreResult<()>;

    /// Remove a relationship and decrement the paper's counter.
    async fn remove_relationship(&self, kind: RelationshipKind, arxiv_id: &str)
    -> StoreResult<()>;

    /// Check whether the current user holds a relationship.
    async fn has_relationship(&self, kind: RelationshipKind, arxiv_id: &str) -> StoreResult<bool>;

    /// Stored counters for the given papers. Unknown ids are absent.
    async fn counters(&self, arxiv_ids: &[String]) -> StoreResult<HashMap<String, Counters>>;

    /// Most liked papers.
    async fn popular_papers(&self, limit: usize) -> StoreResult<Vec<Paper>>;

    /// Papers bookmarked by the current user.
    async fn bookmarked_papers(&self) -> StoreResult<Vec<Paper>>;

    /// Like a paper.
    async fn add_like(&self, paper: &Paper) -> StoreResult<()> {
        self.add_relationship(RelationshipKind::Like, paper).await
    }

    /// Remove a like.
    async fn remove_like(&self, arxiv_id: &str) -> StoreResult<()> {
        self.remove_relationship(RelationshipKind::Like, arxiv_id).await
    }

    /// Check if the current user liked a paper.
    async fn is_liked(&self, arxiv_id: &str) -> StoreResult<bool> {
        self.has_relationship(RelationshipKind::Like, arxiv_id).await
    }

    /// Bookmark a paper.
    async fn add_bookmark(&self, paper: &Paper) -> StoreResult<()> {
        self.add_relationship(RelationshipKind::Bookmark, paper).await
    }

    /// Remove a bookmark.
    async fn remove_bookmark(&self, arxiv_id: &str) -> StoreResult<()> {
        self.remove_relationship(RelationshipKind::Bookmark, arxiv_id).await
    }

    /// Check if the current user bookmarked a paper.
    async fn is_bookmarked(&self, arxiv_id: &str) -> StoreResult<bool> {
        self.has_relationship(RelationshipKind::Bookmark, arxiv_id).await
    }
}
