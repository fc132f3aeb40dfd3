//! Boundary 4 tool interface (§6): one async function per recognized
//! tool, each taking a deserialized argument record and returning a
//! typed result or a typed error. No JSON-RPC dispatch loop lives here —
//! that transport is out of scope — these are plain functions a host
//! wires up however it frames requests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ar_cache::CacheManager;
use ar_client::PdsClient;
use ar_credentials::CredentialStore;
use ar_domain::{Config, Error, Result};
use ar_identity::IdentityResolver;
use ar_repo::{decode_record, ArchiveFetcher, ArchiveReader, DecodedRecord};
use ar_search::SearchEngine;
use ar_thread::ThreadReconstructor;

use crate::args::{
    DeleteArgs, FeedArgs, LikeArgs, LoginArgs, PostArgs, ProfileArgs, RepostArgs, SearchArgs,
    ThreadArgs,
};
use crate::results::{FeedResult, LoginResult, ProfileResult, SearchResult, ThreadResult, WriteResult};
use crate::session::{establish, establish_optional};

const POST_COLLECTION: &str = "app.bsky.feed.post";
const LIKE_COLLECTION: &str = "app.bsky.feed.like";
const REPOST_COLLECTION: &str = "app.bsky.feed.repost";
const DEFAULT_FEED_LIMIT: u32 = 50;
const MAX_FEED_LIMIT: u32 = 100;

pub struct Tools {
    resolver: IdentityResolver,
    fetcher: ArchiveFetcher,
    credentials: CredentialStore,
    search: SearchEngine,
    thread: ThreadReconstructor,
    user_agent: String,
}

impl Tools {
    pub fn new(config: &Config) -> Result<Self> {
        let cache_root = config
            .cache
            .root_override
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(ar_cache::default_cache_root);
        let cache = Arc::new(CacheManager::new(cache_root));
        let fetcher = ArchiveFetcher::new(cache, &config.http.user_agent)?;

        Ok(Self {
            resolver: IdentityResolver::new(config)?,
            fetcher,
            credentials: CredentialStore::new(config),
            search: SearchEngine::new(config)?,
            thread: ThreadReconstructor::new(config)?,
            user_agent: config.http.user_agent.clone(),
        })
    }

    /// `profile{ account }` → extracted profile fields as markdown (§6).
    pub async fn profile(&self, args: ProfileArgs) -> Result<ProfileResult> {
        let sid = self.resolver.resolve(&args.account).await?;
        let hosting_url = self.resolver.resolve_hosting_url(&sid).await?;
        let bytes = self.fetcher.fetch(&sid, &hosting_url, None).await?;

        let reader = ArchiveReader::open(bytes).await?;
        let (_roots, blocks) = reader.load_all_blocks().await?;

        let profile = find_profile(&blocks)?.ok_or_else(|| {
            Error::NotFound(format!("no app.bsky.actor.profile record for {sid}"))
        })?;

        Ok(ProfileResult {
            sid: sid.to_string(),
            markdown: render_profile_markdown(&sid, &profile),
        })
    }

    /// `search{ account, query?, limit? }` → ranked matches (§6).
    pub async fn search(&self, args: SearchArgs) -> Result<SearchResult> {
        let query = args.query.unwrap_or_default();
        let limit = args.limit.unwrap_or(20);
        let matches = self.search.search(&args.account, &query, limit, None).await?;
        Ok(SearchResult { matches })
    }

    /// `feed{ feed?, cursor?, limit?, login?, password? }` → posts (§6).
    pub async fn feed(&self, args: FeedArgs) -> Result<FeedResult> {
        let limit = args.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_FEED_LIMIT);
        let session = establish_optional(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            args.login.as_deref(),
            args.password.as_deref(),
        )
        .await?;

        let (hosting_url, access_token) = match &session {
            Some(s) => (s.hosting_url.clone(), Some(s.access_token.clone())),
            None => {
                let feed_uri = args.feed.as_deref().ok_or_else(|| {
                    Error::InvalidInput(
                        "feed requires either an explicit feed URI or a login session".to_string(),
                    )
                })?;
                let authority = feed_authority(feed_uri)?;
                let sid = self.resolver.resolve(authority).await?;
                (self.resolver.resolve_hosting_url(&sid).await?, None)
            }
        };

        let client = PdsClient::new(&hosting_url, access_token, &self.user_agent)?;
        let response = match &args.feed {
            Some(feed_uri) => client.get_feed(feed_uri, args.cursor.as_deref(), Some(limit)).await?,
            None => client.get_timeline(args.cursor.as_deref(), Some(limit)).await?,
        };

        Ok(FeedResult {
            posts: response.feed.into_iter().map(|f| f.post).collect(),
            cursor: response.cursor,
        })
    }

    /// `thread{ postURI, login?, password? }` → flattened preorder (§6).
    pub async fn thread(&self, args: ThreadArgs) -> Result<ThreadResult> {
        let session = establish_optional(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            args.login.as_deref(),
            args.password.as_deref(),
        )
        .await?;
        let access_token = session.as_ref().map(|s| s.access_token.as_str());
        let posts = self.thread.get_thread(&args.post_uri, access_token).await?;
        Ok(ThreadResult { posts })
    }

    /// `post{ text, replyToURI?, login?, password? }` → new record (§6).
    pub async fn post(&self, args: PostArgs) -> Result<WriteResult> {
        let session = establish(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            args.login.as_deref(),
            args.password.as_deref(),
        )
        .await?;
        let client = PdsClient::new(&session.hosting_url, Some(session.access_token), &self.user_agent)?;

        let mut record = serde_json::json!({
            "$type": POST_COLLECTION,
            "text": args.text,
            "createdAt": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(reply_to) = &args.reply_to_uri {
            let parent = client
                .get_record(
                    session.sid.as_str(),
                    POST_COLLECTION,
                    reply_to.rsplit('/').next().unwrap_or_default(),
                )
                .await?;
            let parent_ref = serde_json::json!({ "uri": reply_to, "cid": parent.cid });
            record["reply"] = serde_json::json!({ "root": parent_ref, "parent": parent_ref });
        }

        let response = client.create_record(session.sid.as_str(), POST_COLLECTION, record).await?;
        Ok(WriteResult { uri: response.uri, cid: response.cid })
    }

    /// `like{ postURI, login?, password? }` → new like record (§6).
    pub async fn like(&self, args: LikeArgs) -> Result<WriteResult> {
        self.create_strong_ref_record(LIKE_COLLECTION, &args.post_uri, args.login, args.password)
            .await
    }

    /// `repost{ postURI, login?, password? }` → new repost record (§6).
    pub async fn repost(&self, args: RepostArgs) -> Result<WriteResult> {
        self.create_strong_ref_record(REPOST_COLLECTION, &args.post_uri, args.login, args.password)
            .await
    }

    async fn create_strong_ref_record(
        &self,
        collection: &str,
        subject_uri: &str,
        login: Option<String>,
        password: Option<String>,
    ) -> Result<WriteResult> {
        let session = establish(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            login.as_deref(),
            password.as_deref(),
        )
        .await?;
        let client = PdsClient::new(&session.hosting_url, Some(session.access_token), &self.user_agent)?;

        let subject = client
            .get_record(
                session.sid.as_str(),
                POST_COLLECTION,
                subject_uri.rsplit('/').next().unwrap_or_default(),
            )
            .await?;
        let record = serde_json::json!({
            "$type": collection,
            "subject": { "uri": subject_uri, "cid": subject.cid },
            "createdAt": chrono::Utc::now().to_rfc3339(),
        });
        let response = client.create_record(session.sid.as_str(), collection, record).await?;
        Ok(WriteResult { uri: response.uri, cid: response.cid })
    }

    /// `delete{ postURI, login?, password? }` → record removed (§6).
    pub async fn delete(&self, args: DeleteArgs) -> Result<()> {
        let session = establish(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            args.login.as_deref(),
            args.password.as_deref(),
        )
        .await?;
        let client = PdsClient::new(&session.hosting_url, Some(session.access_token), &self.user_agent)?;
        let rkey = args.post_uri.rsplit('/').next().unwrap_or_default();
        client.delete_record(session.sid.as_str(), POST_COLLECTION, rkey).await
    }

    /// `login{ login, password }` → establishes and persists the default
    /// session (§4.3).
    pub async fn login(&self, args: LoginArgs) -> Result<LoginResult> {
        let session = establish(
            &self.resolver,
            &self.credentials,
            &self.user_agent,
            Some(&args.login),
            Some(&args.password),
        )
        .await?;
        Ok(LoginResult { sid: session.sid.to_string(), handle: args.login })
    }
}

/// Extract the `<authority>` segment of an `at://<authority>/...` feed
/// generator URI.
fn feed_authority(uri: &str) -> Result<&str> {
    uri.strip_prefix("at://")
        .and_then(|rest| rest.split('/').next())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("malformed feed URI: {uri}")))
}

fn find_profile(blocks: &HashMap<cid::Cid, Vec<u8>>) -> Result<Option<ar_domain::ProfileRecord>> {
    for payload in blocks.values() {
        if let DecodedRecord::Profile(profile) = decode_record(payload)? {
            return Ok(Some(profile));
        }
    }
    Ok(None)
}

fn render_profile_markdown(sid: &ar_domain::Sid, profile: &ar_domain::ProfileRecord) -> String {
    let mut out = String::new();
    let heading = profile.display_name.as_deref().unwrap_or(sid.as_str());
    out.push_str(&format!("# {heading}\n\n"));
    if let Some(description) = &profile.description {
        out.push_str(description);
        out.push_str("\n\n");
    }
    out.push_str(&format!("- SID: `{sid}`\n"));
    if let Some(created_at) = &profile.created_at {
        out.push_str(&format!("- Created: {created_at}\n"));
    }
    if let Some(avatar) = &profile.avatar {
        out.push_str(&format!("- Avatar: `{}`\n", avatar.cid));
    }
    if let Some(banner) = &profile.banner {
        out.push_str(&format!("- Banner: `{}`\n", banner.cid));
    }
    out
}
