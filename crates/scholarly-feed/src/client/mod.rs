//! arXiv paper source.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - A fixed delay before each request
//! - Response caching with a 5-minute TTL

pub mod atom;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, MissingDatePolicy, api};
use crate::error::{ClientError, ClientResult, SourceResult};
use crate::models::FeedPage;

/// Query sent when the caller passes an empty query.
pub const DEFAULT_CATEGORY_QUERY: &str = "cat:cs.AI OR cat:cs.LG OR cat:cs.CL";

/// Anything that can serve pages of papers for a query.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetch `page_size` papers starting at `offset`.
    async fn search(&self, query: &str, offset: usize, page_size: usize)
    -> SourceResult<FeedPage>;
}

/// arXiv Atom API client.
#[derive(Clone)]
pub struct ArxivClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Raw response cache.
    cache: Cache<String, String>,

    /// Query endpoint.
    api_url: String,

    /// Delay before each uncached request.
    rate_limit_delay: Duration,

    /// Handling of entries without a publication date.
    missing_date_policy: MissingDatePolicy,
}

impl ArxivClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("scholarly-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            api_url: config.arxiv_api_url.clone(),
            rate_limit_delay: config.rate_limit_delay,
            missing_date_policy: config.missing_date_policy,
        })
    }

    /// First page of papers in the given arXiv categories.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn recommended(
        &self,
        interests: &[String],
        page_size: usize,
    ) -> SourceResult<FeedPage> {
        let query =
            interests.iter().map(|c| format!("cat:{c}")).collect::<Vec<_>>().join(" OR ");
        self.search(&query, 0, page_size).await
    }

    /// Make a GET request and return the body text.
    async fn get_text(&self, params: &[(&str, String)]) -> ClientResult<String> {
        let cache_key = self.cache_key(params);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::trace!("arXiv cache hit");
            return Ok(cached);
        }

        tokio::time::sleep(self.rate_limit_delay).await;

        let response = self.client.get(&self.api_url).query(params).send().await?;
        let body = handle_response(response).await?.text().await?;
        self.cache.insert(cache_key, body.clone()).await;
        Ok(body)
    }

    /// Generate cache key.
    fn cache_key(&self, params: &[(&str, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(self.api_url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Map non-success statuses to [`ClientError::Status`] carrying the body text.
pub(crate) async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ClientError::status(status.as_u16(), text))
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(
        &self,
        query: &str,
        offset: usize,
        page_size: usize,
    ) -> SourceResult<FeedPage> {
        let query = if query.trim().is_empty() { DEFAULT_CATEGORY_QUERY } else { query };

        let params = [
            ("search_query", query.to_string()),
            ("start", offset.to_string()),
            ("max_results", page_size.to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let body = self.get_text(&params).await.inspect_err(|e| {
            tracing::warn!(query, offset, error = %e, "arXiv request failed");
        })?;

        let entries = atom::parse_feed(&body)?;
        let received = entries.len();
        let papers = atom::normalize_entries(entries, self.missing_date_policy, Utc::now());

        tracing::debug!(query, offset, received, kept = papers.len(), "Fetched arXiv page");

        Ok(FeedPage { papers, offset, has_more: page_size > 0 && received >= page_size })
    }
}

impl std::fmt::Debug for ArxivClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArxivClient").field("api_url", &self.api_url).finish()
    }
}
