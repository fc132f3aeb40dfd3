//! Archive Fetcher (§4.4): transfers archive bytes for an SID into the
//! Cache Manager, honoring validity and coalescing concurrent fetches
//! for the same SID into one in-flight network operation (§5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ar_cache::CacheManager;
use ar_domain::{CacheMetadata, Error, Result, Sid};
use futures_util::StreamExt;
use tokio::sync::Mutex as AsyncMutex;

const ARCHIVE_TTL_HOURS: u64 = 24;
const FETCH_TIMEOUT_SECS: u64 = 60;

pub struct ArchiveFetcher {
    client: reqwest::Client,
    cache: Arc<CacheManager>,
    ttl_hours: u64,
    timeout: Duration,
    in_flight: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ArchiveFetcher {
    pub fn new(cache: Arc<CacheManager>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            cache,
            ttl_hours: ARCHIVE_TTL_HOURS,
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            in_flight: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    fn with_ttl_hours(mut self, ttl_hours: u64) -> Self {
        self.ttl_hours = ttl_hours;
        self
    }

    fn lock_for(&self, sid: &str) -> Arc<AsyncMutex<()>> {
        self.in_flight
            .lock()
            .entry(sid.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Fetch the archive for `sid` from `hosting_url`, skipping the
    /// network if a valid cached copy already exists. `access_token`, if
    /// present, is sent as a bearer credential for private repos.
    pub async fn fetch(
        &self,
        sid: &Sid,
        hosting_url: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<u8>> {
        if self.cache.is_valid(sid.as_str(), self.ttl_hours).await {
            return self.cache.read_bytes(sid.as_str()).await;
        }

        // Per-SID lock coalesces concurrent callers into one network
        // fetch: the first caller through does the work; everyone else
        // blocks here and then observes the now-valid cache below.
        let lock = self.lock_for(sid.as_str());
        let _guard = lock.lock().await;

        if self.cache.is_valid(sid.as_str(), self.ttl_hours).await {
            return self.cache.read_bytes(sid.as_str()).await;
        }

        let url = format!(
            "{}/xrpc/com.atproto.sync.getRepo?did={}",
            hosting_url.trim_end_matches('/'),
            sid
        );
        let mut request = self.client.get(&url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| Error::Timeout(format!("fetching archive for {sid}")))?
            .map_err(|e| Error::RepoFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::RepoFetchFailed(format!(
                "HTTP {} fetching archive for {sid}",
                response.status()
            )));
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::RepoFetchFailed(e.to_string()))?;
            body.extend_from_slice(&chunk);
        }

        let metadata = CacheMetadata::new(sid.as_str().to_string(), self.ttl_hours, now_unix())
            .with_headers(etag, last_modified, Some(body.len() as u64));
        self.cache.store(sid.as_str(), &body, &metadata).await?;

        Ok(body)
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
