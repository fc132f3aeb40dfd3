//! Response shapes for the hosting-server HTTP surface (§6 Boundary 1).
//!
//! Only the fields `ar-thread` and `ar-tools` actually consume are
//! modeled; everything else in a PDS response is ignored by `serde`'s
//! default behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorView {
    pub did: String,
    pub handle: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: AuthorView,
    pub record: serde_json::Value,
    #[serde(rename = "indexedAt")]
    pub indexed_at: Option<String>,
    #[serde(rename = "likeCount", default)]
    pub like_count: Option<u64>,
    #[serde(rename = "repostCount", default)]
    pub repost_count: Option<u64>,
}

/// One node of a `getPostThread` response. The real endpoint can also
/// return `notFoundPost`/`blockedPost` variants in place of a post; those
/// are modeled as leaves with no replies so flattening degrades
/// gracefully instead of failing the whole thread.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum ThreadViewNode {
    #[serde(rename = "app.bsky.feed.defs#threadViewPost")]
    Post {
        post: PostView,
        #[serde(default)]
        replies: Vec<ThreadViewNode>,
    },
    #[serde(rename = "app.bsky.feed.defs#notFoundPost")]
    NotFound { uri: String },
    #[serde(rename = "app.bsky.feed.defs#blockedPost")]
    Blocked { uri: String },
}

impl ThreadViewNode {
    /// Flatten the thread into preorder (this node first, then each
    /// reply subtree in order). `notFoundPost`/`blockedPost` nodes
    /// contribute nothing (§4.9 only reconstructs actual posts).
    pub fn flatten_preorder(&self) -> Vec<PostView> {
        let mut out = Vec::new();
        self.collect_preorder(&mut out);
        out
    }

    fn collect_preorder(&self, out: &mut Vec<PostView>) {
        if let ThreadViewNode::Post { post, replies } = self {
            out.push(post.clone());
            for reply in replies {
                reply.collect_preorder(out);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPostThreadResponse {
    pub thread: ThreadViewNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetFeedResponse {
    pub feed: Vec<FeedViewPost>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordResponse {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub rkey: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub did: String,
    pub handle: String,
    #[serde(rename = "accessJwt")]
    pub access_jwt: String,
    #[serde(rename = "refreshJwt")]
    pub refresh_jwt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRecordResponse {
    pub uri: String,
    pub cid: Option<String>,
    pub value: serde_json::Value,
}
