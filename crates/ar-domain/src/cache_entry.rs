//! Archive cache metadata (§3, §4.1).

use serde::{Deserialize, Serialize};

/// Sidecar metadata persisted alongside cached archive bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheMetadata {
    pub sid: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<u64>,
    /// Unix seconds at which this entry was stored.
    pub cached_at: i64,
    pub ttl_hours: u64,
}

impl CacheMetadata {
    pub fn new(sid: String, ttl_hours: u64, cached_at: i64) -> Self {
        Self {
            sid,
            etag: None,
            last_modified: None,
            content_length: None,
            cached_at,
            ttl_hours,
        }
    }

    pub fn with_headers(
        mut self,
        etag: Option<String>,
        last_modified: Option<String>,
        content_length: Option<u64>,
    ) -> Self {
        self.etag = etag;
        self.last_modified = last_modified;
        self.content_length = content_length;
        self
    }

    /// True iff `cached_at + ttl_hours` is in the future relative to `now`.
    pub fn is_valid_at(&self, now_unix: i64) -> bool {
        let expiry = self.cached_at + (self.ttl_hours as i64) * 3600;
        now_unix < expiry
    }
}
