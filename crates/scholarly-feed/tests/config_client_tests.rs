//! Configuration and client construction tests.

use std::time::Duration;

use scholarly_feed::config::{Config, MissingDatePolicy};
use scholarly_feed::interaction::GestureThresholds;
use scholarly_feed::{ArxivClient, SupabaseStore};

// =============================================================================
// Config Behavior Tests
// =============================================================================

#[test]
fn test_default_config_has_no_remote_store() {
    let config = Config::default();
    assert!(!config.has_remote_store());
    assert!(config.arxiv_api_url.starts_with("http://export.arxiv.org"));
}

#[test]
fn test_remote_store_needs_url_and_key() {
    assert!(!Config::new(Some("https://x.supabase.co".to_string()), None).has_remote_store());
    assert!(!Config::new(None, Some("key".to_string())).has_remote_store());
    assert!(
        Config::new(Some("https://x.supabase.co".to_string()), Some("key".to_string()))
            .has_remote_store()
    );
}

#[test]
fn test_feed_defaults() {
    let config = Config::default();
    assert_eq!(config.page_size, 10);
    assert_eq!(config.search_debounce, Duration::from_millis(500));
    assert_eq!(config.missing_date_policy, MissingDatePolicy::Reject);
    assert_eq!(config.gestures, GestureThresholds::default());
}

#[test]
fn test_testing_config_disables_delays() {
    let config = Config::for_testing("http://127.0.0.1:9");
    assert_eq!(config.arxiv_api_url, "http://127.0.0.1:9/api/query");
    assert_eq!(config.rate_limit_delay, Duration::ZERO);
    assert_eq!(config.chat_reply_delay, Duration::ZERO);
    assert_eq!(config.max_retries, 0);
    assert!(config.has_remote_store());
}

// =============================================================================
// Client Behavior Tests
// =============================================================================

#[test]
fn test_arxiv_client_creation_succeeds() {
    assert!(ArxivClient::new(&Config::default()).is_ok());
}

#[test]
fn test_supabase_store_requires_project() {
    assert!(SupabaseStore::new(&Config::default()).is_err());
    assert!(SupabaseStore::new(&Config::for_testing("http://127.0.0.1:9")).is_ok());
}

#[test]
fn test_supabase_debug_hides_key() {
    let store = SupabaseStore::new(&Config::for_testing("http://127.0.0.1:9")).unwrap();
    let debug = format!("{store:?}");
    assert!(!debug.contains("test-anon-key"));
}
