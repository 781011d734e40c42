//! Supabase backend: GoTrue auth plus PostgREST tables.
//!
//! Tables used:
//! - `papers` keyed by `id` (the arXiv id) with `likes`/`bookmarks` counters
//! - `likes` and `bookmarks` join tables of `(user_id, paper_id)`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::RemoteStore;
use crate::client::handle_response;
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult, StoreError, StoreResult};
use crate::models::{Counters, Paper, PaperRow, RelationshipKind, RelationshipRow, User};

/// Token grant answer from GoTrue.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

/// Sign-up answer: a session, or the bare user while email confirmation
/// is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Pending(User),
}

/// Embedded `paper:papers(*)` select on a join table.
#[derive(Debug, Deserialize)]
struct EmbeddedPaper {
    paper: Option<PaperRow>,
}

#[derive(Clone)]
struct AuthSession {
    access_token: String,
    user: User,
}

/// Supabase-backed store.
#[derive(Clone)]
pub struct SupabaseStore {
    client: ClientWithMiddleware,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl SupabaseStore {
    /// Create a store for the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns error if the project URL or key is missing, or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let (Some(base_url), Some(anon_key)) = (&config.supabase_url, &config.supabase_anon_key)
        else {
            anyhow::bail!("SUPABASE_URL and SUPABASE_ANON_KEY must both be set");
        };

        let client = Client::builder()
            .user_agent(concat!("scholarly-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    // ========================================================================
    // HTTP helpers
    // ========================================================================

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        token: Option<&str>,
    ) -> ClientResult<Vec<T>> {
        let response = self
            .request(Method::GET, &format!("rest/v1/{table}"), token)
            .query(params)
            .send()
            .await?;

        let response = handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;

        serde_json::from_value(value).map_err(ClientError::from)
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        row: &T,
        token: &str,
    ) -> ClientResult<()> {
        let body = serde_json::to_string(row)?;
        let response = self
            .request(Method::POST, &format!("rest/v1/{table}"), Some(token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(body)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        filter: &[(&str, String)],
        body: &serde_json::Value,
        token: &str,
    ) -> ClientResult<()> {
        let body = serde_json::to_string(body)?;
        let response = self
            .request(Method::PATCH, &format!("rest/v1/{table}"), Some(token))
            .query(filter)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &[(&str, String)], token: &str) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &format!("rest/v1/{table}"), Some(token))
            .query(filter)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
    }

    // ========================================================================
    // Table operations
    // ========================================================================

    async fn find_paper(&self, arxiv_id: &str, token: &str) -> StoreResult<Option<PaperRow>> {
        let rows: Vec<PaperRow> = self
            .select(
                "papers",
                &[("select", "*".to_string()), ("arxiv_id", format!("eq.{arxiv_id}"))],
                Some(token),
            )
            .await
            .map_err(|e| StoreError::failure("select paper", e))?;
        Ok(rows.into_iter().next())
    }

    async fn find_relationship(
        &self,
        kind: RelationshipKind,
        user_id: &str,
        paper_id: &str,
        token: &str,
    ) -> StoreResult<bool> {
        let rows: Vec<RelationshipRow> = self
            .select(
                kind.table(),
                &[
                    ("select", "user_id,paper_id".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("paper_id", format!("eq.{paper_id}")),
                ],
                Some(token),
            )
            .await
            .map_err(|e| StoreError::failure("select relationship", e))?;
        Ok(!rows.is_empty())
    }

    async fn set_counter(
        &self,
        kind: RelationshipKind,
        paper_id: &str,
        value: u32,
        token: &str,
    ) -> ClientResult<()> {
        let mut body = serde_json::Map::new();
        body.insert(kind.counter_column().to_string(), serde_json::Value::from(value));
        self.update(
            "papers",
            &[("id", format!("eq.{paper_id}"))],
            &serde_json::Value::Object(body),
            token,
        )
        .await
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn current_user(&self) -> StoreResult<Option<User>> {
        Ok(self.session().await.map(|s| s.user))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<User> {
        let body = serde_json::json!({ "email": email, "password": password });
        let body = serde_json::to_string(&body).map_err(|e| StoreError::failure("sign in", e))?;

        let response = self
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::failure("sign in", e))?;

        let response =
            handle_response(response).await.map_err(|e| StoreError::failure("sign in", e))?;
        let token: TokenResponse =
            response.json().await.map_err(|e| StoreError::failure("sign in", e))?;

        tracing::info!(user_id = %token.user.id, "Signed in");
        let user = token.user.clone();
        *self.session.write().await =
            Some(AuthSession { access_token: token.access_token, user: token.user });
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> StoreResult<User> {
        let body = serde_json::json!({ "email": email, "password": password });
        let body = serde_json::to_string(&body).map_err(|e| StoreError::failure("sign up", e))?;

        let response = self
            .request(Method::POST, "auth/v1/signup", None)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::failure("sign up", e))?;

        let response =
            handle_response(response).await.map_err(|e| StoreError::failure("sign up", e))?;
        let answer: SignUpResponse =
            response.json().await.map_err(|e| StoreError::failure("sign up", e))?;

        match answer {
            SignUpResponse::Session(token) => {
                tracing::info!(user_id = %token.user.id, "Signed up");
                let user = token.user.clone();
                *self.session.write().await =
                    Some(AuthSession { access_token: token.access_token, user: token.user });
                Ok(user)
            }
            SignUpResponse::Pending(user) => {
                tracing::info!(user_id = %user.id, "Signed up; awaiting email confirmation");
                Ok(user)
            }
        }
    }

    async fn sign_out(&self) -> StoreResult<()> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        let response = self
            .request(Method::POST, "auth/v1/logout", Some(&session.access_token))
            .send()
            .await
            .map_err(|e| StoreError::failure("sign out", e))?;
        handle_response(response).await.map_err(|e| StoreError::failure("sign out", e))?;

        tracing::info!(user_id = %session.user.id, "Signed out");
        Ok(())
    }

    async fn add_relationship(&self, kind: RelationshipKind, paper: &Paper) -> StoreResult<()> {
        let Some(session) = self.session().await else {
            tracing::info!(%kind, arxiv_id = %paper.arxiv_id, "No session; skipping add");
            return Ok(());
        };
        let token = session.access_token.as_str();
        let user_id = session.user.id.as_str();

        let existing = self.find_paper(&paper.arxiv_id, token).await?;
        if let Some(row) = &existing {
            if self.find_relationship(kind, user_id, &row.id, token).await? {
                tracing::debug!(%kind, arxiv_id = %paper.arxiv_id, "Relationship already stored");
                return Ok(());
            }
        }

        // Counter first, then the relationship row
        let (paper_id, previous) = match existing {
            Some(row) => {
                let mut counters = row.counters();
                let previous = counters.get(kind);
                counters.increment(kind);
                self.set_counter(kind, &row.id, counters.get(kind), token)
                    .await
                    .map_err(|e| StoreError::failure("update counter", e))?;
                (row.id, previous)
            }
            None => {
                let row = PaperRow::from_paper(paper, Counters::seeded(kind));
                self.insert("papers", &row, token)
                    .await
                    .map_err(|e| StoreError::failure("insert paper", e))?;
                (row.id, 0)
            }
        };

        let relationship = RelationshipRow { user_id: user_id.to_string(), paper_id: paper_id.clone() };
        if let Err(e) = self.insert(kind.table(), &relationship, token).await {
            tracing::warn!(%kind, %paper_id, error = %e, "Relationship insert failed; reverting counter");
            if let Err(revert) = self.set_counter(kind, &paper_id, previous, token).await {
                tracing::error!(%kind, %paper_id, error = %revert, "Counter revert failed");
            }
            return Err(StoreError::failure("insert relationship", e));
        }

        tracing::debug!(%kind, %paper_id, "Relationship stored");
        Ok(())
    }

    async fn remove_relationship(
        &self,
        kind: RelationshipKind,
        arxiv_id: &str,
    ) -> StoreResult<()> {
        let Some(session) = self.session().await else {
            tracing::info!(%kind, arxiv_id, "No session; skipping remove");
            return Ok(());
        };
        let token = session.access_token.as_str();
        let user_id = session.user.id.as_str();

        let Some(row) = self.find_paper(arxiv_id, token).await? else {
            return Ok(());
        };
        if !self.find_relationship(kind, user_id, &row.id, token).await? {
            return Ok(());
        }

        self.delete(
            kind.table(),
            &[("user_id", format!("eq.{user_id}")), ("paper_id", format!("eq.{}", row.id))],
            token,
        )
        .await
        .map_err(|e| StoreError::failure("delete relationship", e))?;

        let mut counters = row.counters();
        counters.decrement(kind);
        self.set_counter(kind, &row.id, counters.get(kind), token)
            .await
            .map_err(|e| StoreError::failure("update counter", e))?;

        tracing::debug!(%kind, arxiv_id, "Relationship removed");
        Ok(())
    }

    async fn has_relationship(&self, kind: RelationshipKind, arxiv_id: &str) -> StoreResult<bool> {
        let Some(session) = self.session().await else {
            return Ok(false);
        };
        let token = session.access_token.as_str();

        match self.find_paper(arxiv_id, token).await? {
            Some(row) => self.find_relationship(kind, &session.user.id, &row.id, token).await,
            None => Ok(false),
        }
    }

    async fn counters(&self, arxiv_ids: &[String]) -> StoreResult<HashMap<String, Counters>> {
        if arxiv_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let session = self.session().await;
        let token = session.as_ref().map(|s| s.access_token.as_str());

        let list = arxiv_ids.iter().map(|id| format!("\"{id}\"")).collect::<Vec<_>>().join(",");
        let rows: Vec<PaperRow> = self
            .select(
                "papers",
                &[
                    ("select", "id,arxiv_id,likes,bookmarks".to_string()),
                    ("arxiv_id", format!("in.({list})")),
                ],
                token,
            )
            .await
            .map_err(|e| StoreError::failure("select counters", e))?;

        Ok(rows.into_iter().map(|row| (row.arxiv_id.clone(), row.counters())).collect())
    }

    async fn popular_papers(&self, limit: usize) -> StoreResult<Vec<Paper>> {
        let session = self.session().await;
        let token = session.as_ref().map(|s| s.access_token.as_str());

        let rows: Vec<PaperRow> = self
            .select(
                "papers",
                &[
                    ("select", "*".to_string()),
                    ("order", "likes.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
                token,
            )
            .await
            .map_err(|e| StoreError::failure("select popular", e))?;

        Ok(rows.into_iter().map(PaperRow::into_paper).collect())
    }

    async fn bookmarked_papers(&self) -> StoreResult<Vec<Paper>> {
        let Some(session) = self.session().await else {
            return Ok(Vec::new());
        };

        let rows: Vec<EmbeddedPaper> = self
            .select(
                "bookmarks",
                &[
                    ("select", "paper:papers(*)".to_string()),
                    ("user_id", format!("eq.{}", session.user.id)),
                ],
                Some(&session.access_token),
            )
            .await
            .map_err(|e| StoreError::failure("select bookmarks", e))?;

        Ok(rows
            .into_iter()
            .filter_map(|r| r.paper)
            .map(|row| Paper { bookmarked: true, ..row.into_paper() })
            .collect())
    }
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
