//! Feed state: pagination, query changes, overlay and the async session.

mod controller;
mod debounce;
mod session;

pub use controller::{FeedController, FeedStatus, FetchKind, FetchTicket, OverlayChange};
pub use debounce::Debouncer;
pub use session::{ChatHandoff, FeedSession};
