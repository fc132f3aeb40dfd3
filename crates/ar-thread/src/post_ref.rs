//! Parses a post reference in either of the two forms §4.9 names: an
//! `at://` URI, or a web URL of the form
//! `https://<host>/profile/<handle-or-sid>/post/<rkey>`.

use ar_domain::{Error, Result};

/// A parsed reference to one post, before the account component has
/// been resolved to an SID.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRef {
    pub account: String,
    pub collection: String,
    pub rkey: String,
}

impl PostRef {
    pub fn parse(reference: &str) -> Result<Self> {
        if let Some(rest) = reference.strip_prefix("at://") {
            return parse_at_uri(rest);
        }
        if reference.starts_with("https://") || reference.starts_with("http://") {
            return parse_web_url(reference);
        }
        Err(Error::InvalidInput(format!(
            "not a recognized post reference: \"{reference}\""
        )))
    }
}

fn parse_at_uri(rest: &str) -> Result<PostRef> {
    let mut parts = rest.splitn(3, '/');
    let account = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput("at:// URI is missing an account".into()))?;
    let collection = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput("at:// URI is missing a collection".into()))?;
    let rkey = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput("at:// URI is missing an rkey".into()))?;
    Ok(PostRef {
        account: account.to_string(),
        collection: collection.to_string(),
        rkey: rkey.to_string(),
    })
}

/// `https://<host>/profile/<handle-or-sid>/post/<rkey>`. The web view
/// always refers to `app.bsky.feed.post`.
fn parse_web_url(url: &str) -> Result<PostRef> {
    let invalid = || {
        Error::InvalidInput(format!(
            "not a recognized post web URL (expected .../profile/<account>/post/<rkey>): \"{url}\""
        ))
    };
    let after_scheme = url
        .splitn(2, "://")
        .nth(1)
        .ok_or_else(invalid)?;
    let path_start = after_scheme.find('/').ok_or_else(invalid)?;
    let path = &after_scheme[path_start + 1..];

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 4 || segments[0] != "profile" || segments[2] != "post" {
        return Err(invalid());
    }
    let account = segments[1];
    let rkey = segments[3];
    if account.is_empty() || rkey.is_empty() {
        return Err(invalid());
    }

    Ok(PostRef {
        account: account.to_string(),
        collection: "app.bsky.feed.post".to_string(),
        rkey: rkey.to_string(),
    })
}
