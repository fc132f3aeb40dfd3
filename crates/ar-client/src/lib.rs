//! Typed HTTP client for the hosting-server surface consumed by
//! `ar-thread` and `ar-tools` (§6 Boundary 1): record read/write and the
//! thread/feed view endpoints. Shared here rather than duplicated so
//! neither crate re-implements `reqwest` client setup and header
//! decoration.

mod client;
mod types;

pub use client::PdsClient;
pub use types::{
    AuthorView, CreateRecordResponse, CreateSessionResponse, FeedViewPost, GetFeedResponse,
    GetRecordResponse, PostView, ThreadViewNode,
};
