//! Integration tests against the live arXiv API.
//!
//! Run with: `cargo test --features integration -- --nocapture`

#![cfg(feature = "integration")]

use std::sync::Arc;

use scholarly_feed::config::Config;
use scholarly_feed::feed::{FeedSession, FeedStatus};
use scholarly_feed::interaction::NoopHaptics;
use scholarly_feed::{ArxivClient, MemoryStore, PaperSource};

fn create_client() -> ArxivClient {
    ArxivClient::new(&Config::default()).expect("Failed to create client")
}

#[tokio::test]
async fn test_live_default_feed() {
    let client = create_client();
    let page = client.search("", 0, 5).await.expect("search");

    assert!(!page.papers.is_empty());
    for paper in &page.papers {
        assert!(!paper.title.is_empty());
        assert!(!paper.authors.is_empty());
        assert!(paper.published.is_some());
    }
}

#[tokio::test]
async fn test_live_second_page_offset() {
    let client = create_client();
    let query = scholarly_feed::query::build("transformers", &["cs.CL"]);
    let page = client.search(&query, 5, 5).await.expect("search");

    assert_eq!(page.offset, 5);
    println!("{} papers, has_more={}", page.papers.len(), page.has_more);
}

#[tokio::test]
async fn test_live_session_pages() {
    let config = Config::default();
    let session = FeedSession::new(
        &config,
        Arc::new(create_client()),
        Arc::new(MemoryStore::new()),
        Arc::new(NoopHaptics),
    );

    session.start().await;
    let first = session.papers().await.len();
    session.load_more().await;

    let controller = session.controller().await;
    assert_eq!(controller.status(), FeedStatus::Ready);
    assert!(controller.papers().len() >= first);
}
