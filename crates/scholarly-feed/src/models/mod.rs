//! Data models for papers, feed pages and remote store rows.
//!
//! Remote rows use `#[serde(default)]` for optional columns so partial
//! PostgREST selects deserialize cleanly.

mod enums;
mod feed;
mod paper;
mod row;

pub use enums::{RelationshipKind, ResponseFormat};
pub use feed::{FeedPage, FeedQuery};
pub use paper::{Paper, PaperLinks, UNKNOWN_AUTHOR, UNCATEGORIZED};
pub use row::{Counters, PaperRow, RelationshipRow, User};
