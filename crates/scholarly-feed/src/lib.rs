//! Scholarly Feed
//!
//! The feed and interaction core of a paper-discovery app: arXiv search,
//! a paged card feed, swipe/tap gesture handling, and like/bookmark state
//! mirrored against a remote Supabase backend.
//!
//! # Features
//!
//! - **Query builder**: free text plus category filters into one arXiv query
//! - **Paper source**: Atom feed client with retry, caching and normalization
//! - **Feed controller**: pagination state machine with a single fetch in flight
//! - **Interaction dispatcher**: per-card gesture state machine and double-tap
//! - **Remote store**: likes and bookmarks with optimistic local overlay
//!
//! # Example
//!
//! ```no_run
//! use scholarly_feed::{client::ArxivClient, config::Config, PaperSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = ArxivClient::new(&config)?;
//!
//!     let query = scholarly_feed::query::build("diffusion", &["cs.CV".to_string()]);
//!     let page = client.search(&query, 0, config.page_size).await?;
//!     println!("{} papers, more: {}", page.papers.len(), page.has_more);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod formatters;
pub mod interaction;
pub mod models;
pub mod query;
pub mod store;

pub use client::{ArxivClient, PaperSource};
pub use config::Config;
pub use error::{ClientError, SourceError, StoreError};
pub use feed::{FeedController, FeedSession};
pub use interaction::{Action, InteractionDispatcher};
pub use store::{MemoryStore, RemoteStore, SupabaseStore};
