//! Deserialized argument records for each tool (§6 Boundary 4).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileArgs {
    pub account: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub account: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedArgs {
    pub feed: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadArgs {
    #[serde(rename = "postURI")]
    pub post_uri: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostArgs {
    pub text: String,
    #[serde(rename = "replyToURI", default)]
    pub reply_to_uri: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LikeArgs {
    #[serde(rename = "postURI")]
    pub post_uri: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepostArgs {
    #[serde(rename = "postURI")]
    pub post_uri: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteArgs {
    #[serde(rename = "postURI")]
    pub post_uri: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginArgs {
    pub login: String,
    pub password: String,
}
