//! Search Engine (§4.8): resolves an account, fetches and caches its
//! archive, walks the tree and decodes posts, then ranks matches against
//! a query.

use std::path::PathBuf;
use std::sync::Arc;

use ar_cache::CacheManager;
use ar_domain::{record_uri, Config, Error, PostRecord, Result};
use ar_identity::IdentityResolver;
use ar_repo::{decode_record, walk_collection, ArchiveFetcher, ArchiveReader, DecodedRecord};

use crate::matcher::{match_text, MatchKind};

const POST_COLLECTION: &str = "app.bsky.feed.post";

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub uri: String,
    pub text: String,
    pub created_at: String,
    /// Byte ranges in `text`'s lowercased searchable projection that
    /// matched the query (§4.8 step 6).
    pub highlights: Vec<(usize, usize)>,
}

pub struct SearchEngine {
    resolver: IdentityResolver,
    fetcher: ArchiveFetcher,
    max_query_len: usize,
}

impl SearchEngine {
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
            max_query_len: config.search.max_query_len,
        })
    }

    /// Search `account`'s posts for `query`, returning up to `limit`
    /// ranked matches (§4.8 steps 1-6).
    pub async fn search(
        &self,
        account: &str,
        query: &str,
        limit: usize,
        access_token: Option<&str>,
    ) -> Result<Vec<SearchMatch>> {
        if query.chars().count() > self.max_query_len {
            return Err(Error::InvalidInput(format!(
                "query exceeds maximum length of {} characters",
                self.max_query_len
            )));
        }

        let sid = self.resolver.resolve(account).await?;
        let hosting_url = self.resolver.resolve_hosting_url(&sid).await?;
        let bytes = self.fetcher.fetch(&sid, &hosting_url, access_token).await?;

        let reader = ArchiveReader::open(bytes).await?;
        let (roots, blocks) = reader.load_all_blocks().await?;
        let rkeys = walk_collection(&blocks, &roots, POST_COLLECTION)?;

        let query_lower = query.to_lowercase();
        let mut scored: Vec<(cid::Cid, PostRecord, MatchKind, Vec<(usize, usize)>)> = Vec::new();

        for (cid, payload) in &blocks {
            let DecodedRecord::Post(post) = decode_record(payload)? else {
                continue;
            };
            let searchable = post.searchable_text().to_lowercase();
            if let Some(m) = match_text(&searchable, &query_lower) {
                scored.push((*cid, post, m.kind, m.highlights));
            }
        }

        scored.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.1.created_at.cmp(&a.1.created_at)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(cid, post, _kind, highlights)| {
                let uri = match rkeys.get(&cid) {
                    Some(rkey) => record_uri(&sid, POST_COLLECTION, rkey),
                    None => {
                        tracing::warn!(
                            cid = %cid,
                            "post block has no resolvable rkey in the tree mapping"
                        );
                        format!("at://{sid}/{POST_COLLECTION}/unresolved-{cid}")
                    }
                };
                SearchMatch {
                    uri,
                    text: post.text,
                    created_at: post.created_at,
                    highlights,
                }
            })
            .collect())
    }
}

/// Verify every reachable post block has a resolvable rkey in the tree
/// mapping (§8 invariant, §9's redesign flag making the walker
/// mandatory). Callers that need a hard integrity check — rather than
/// the best-effort `search()` above — call this before trusting a
/// cached archive's URIs.
pub fn check_all_posts_resolvable(
    blocks: &std::collections::HashMap<cid::Cid, Vec<u8>>,
    roots: &[cid::Cid],
) -> Result<()> {
    let rkeys = walk_collection(blocks, roots, POST_COLLECTION)?;
    for (cid, payload) in blocks {
        if matches!(decode_record(payload)?, DecodedRecord::Post(_)) && !rkeys.contains_key(cid) {
            return Err(Error::RepoParseFailed(format!(
                "post block {cid} is unreachable via the tree — missing rkey"
            )));
        }
    }
    Ok(())
}
