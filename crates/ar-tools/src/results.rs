//! Typed return values for each tool (§6 Boundary 4).

use ar_client::PostView;
use ar_search::SearchMatch;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult {
    pub sid: String,
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone)]
pub struct FeedResult {
    pub posts: Vec<PostView>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ThreadResult {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResult {
    pub sid: String,
    pub handle: String,
}
