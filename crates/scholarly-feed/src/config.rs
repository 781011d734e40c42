//! Configuration for the paper feed.

use std::time::Duration;

use crate::interaction::GestureThresholds;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// arXiv query endpoint.
    pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Delay before each arXiv request.
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

    /// Retries for transient failures (5xx, connection resets).
    pub const MAX_RETRIES: u32 = 3;

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum number of cached result pages.
    pub const CACHE_MAX_SIZE: u64 = 256;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Feed behaviour constants.
pub mod feed {
    use std::time::Duration;

    /// Papers requested per fetch.
    pub const PAGE_SIZE: usize = 10;

    /// Quiet period after the last keystroke before a search is issued.
    pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

    /// Simulated assistant latency on the chat screen.
    pub const CHAT_REPLY_DELAY: Duration = Duration::from_secs(1);
}

/// What to do with an Atom entry that carries no usable publication date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDatePolicy {
    /// Drop the entry as malformed.
    #[default]
    Reject,
    /// Stamp the entry with the current time.
    CurrentTime,
}

/// Feed configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// arXiv query endpoint (overridable for mock servers).
    pub arxiv_api_url: String,

    /// Supabase project URL. `None` disables the remote store.
    pub supabase_url: Option<String>,

    /// Supabase anonymous API key.
    pub supabase_anon_key: Option<String>,

    /// Papers requested per fetch.
    pub page_size: usize,

    /// Search debounce window.
    pub search_debounce: Duration,

    /// Simulated chat reply delay.
    pub chat_reply_delay: Duration,

    /// Gesture distances and tap timing.
    pub gestures: GestureThresholds,

    /// Handling of entries without a publication date.
    pub missing_date_policy: MissingDatePolicy,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Delay before each arXiv request.
    pub rate_limit_delay: Duration,

    /// Retries for transient failures.
    pub max_retries: u32,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a configuration with production defaults and an optional
    /// Supabase project.
    #[must_use]
    pub fn new(supabase_url: Option<String>, supabase_anon_key: Option<String>) -> Self {
        Self {
            arxiv_api_url: api::ARXIV_API_URL.to_string(),
            supabase_url,
            supabase_anon_key,
            page_size: feed::PAGE_SIZE,
            search_debounce: feed::SEARCH_DEBOUNCE,
            chat_reply_delay: feed::CHAT_REPLY_DELAY,
            gestures: GestureThresholds::default(),
            missing_date_policy: MissingDatePolicy::default(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            rate_limit_delay: api::RATE_LIMIT_DELAY,
            max_retries: api::MAX_RETRIES,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing both arXiv and Supabase at a
    /// mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            arxiv_api_url: format!("{base_url}/api/query"),
            supabase_url: Some(base_url.to_string()),
            supabase_anon_key: Some("test-anon-key".to_string()),
            page_size: feed::PAGE_SIZE,
            search_debounce: feed::SEARCH_DEBOUNCE,
            chat_reply_delay: Duration::from_millis(0),
            gestures: GestureThresholds::default(),
            missing_date_policy: MissingDatePolicy::default(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            rate_limit_delay: Duration::from_millis(0), // No delay in tests
            max_retries: 0,
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
        }
    }

    /// Create configuration from environment variables (and `.env`).
    ///
    /// Reads `ARXIV_API_URL`, `SUPABASE_URL`, `SUPABASE_ANON_KEY` and
    /// `SCHOLARLY_PAGE_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns error if a URL or the page size is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let supabase_url = std::env::var("SUPABASE_URL").ok().filter(|v| !v.is_empty());
        if let Some(ref raw) = supabase_url {
            url::Url::parse(raw)
                .map_err(|e| anyhow::anyhow!("SUPABASE_URL is not a valid URL: {e}"))?;
        }
        let anon_key = std::env::var("SUPABASE_ANON_KEY").ok().filter(|v| !v.is_empty());

        let mut config = Self::new(supabase_url, anon_key);

        if let Ok(raw) = std::env::var("ARXIV_API_URL") {
            url::Url::parse(&raw)
                .map_err(|e| anyhow::anyhow!("ARXIV_API_URL is not a valid URL: {e}"))?;
            config.arxiv_api_url = raw;
        }

        if let Ok(raw) = std::env::var("SCHOLARLY_PAGE_SIZE") {
            let size: usize = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("SCHOLARLY_PAGE_SIZE must be a number: {e}"))?;
            anyhow::ensure!(size > 0, "SCHOLARLY_PAGE_SIZE must be positive");
            config.page_size = size;
        }

        Ok(config)
    }

    /// Check if a remote store is configured.
    #[must_use]
    pub const fn has_remote_store(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_remote_store());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.missing_date_policy, MissingDatePolicy::Reject);
    }

    #[test]
    fn test_config_with_supabase() {
        let config = Config::new(
            Some("https://project.supabase.co".to_string()),
            Some("anon".to_string()),
        );
        assert!(config.has_remote_store());
    }

    #[test]
    fn test_config_for_testing_urls() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.arxiv_api_url, "http://127.0.0.1:9999/api/query");
        assert_eq!(config.supabase_url.as_deref(), Some("http://127.0.0.1:9999"));
        assert_eq!(config.max_retries, 0);
    }
}
