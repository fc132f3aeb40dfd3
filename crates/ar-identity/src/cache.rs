//! In-memory TTL cache for resolved identities (§4.2).

use std::collections::HashMap;

use ar_domain::Sid;
use parking_lot::RwLock;

struct Entry {
    sid: Sid,
    expires_at: i64,
}

/// Maps an input account string (handle or SID) to a resolved SID, with
/// lazy eviction of expired entries on lookup.
pub struct ResolutionCache {
    ttl_secs: i64,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResolutionCache {
    pub fn new(ttl_hours: u64) -> Self {
        Self {
            ttl_secs: (ttl_hours as i64) * 3600,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str, now_unix: i64) -> Option<Sid> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.expires_at > now_unix {
            Some(entry.sid.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, sid: Sid, now_unix: i64) {
        self.entries.write().insert(
            key,
            Entry {
                sid,
                expires_at: now_unix + self.ttl_secs,
            },
        );
    }

    /// Drop every expired entry. Not required for correctness (lookups
    /// already treat expired entries as misses) but bounds memory.
    pub fn cleanup(&self, now_unix: i64) {
        self.entries.write().retain(|_, e| e.expires_at > now_unix);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> Sid {
        Sid::parse("did:plc:5cajdgeo6qz32kptlpg4c3lv").unwrap()
    }

    #[test]
    fn put_then_get_within_ttl() {
        let cache = ResolutionCache::new(1);
        cache.put("alice.example".into(), sid(), 1000);
        assert_eq!(cache.get("alice.example", 1000), Some(sid()));
        assert_eq!(cache.get("alice.example", 1000 + 3599), Some(sid()));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ResolutionCache::new(1);
        cache.put("alice.example".into(), sid(), 1000);
        assert_eq!(cache.get("alice.example", 1000 + 3601), None);
    }

    #[test]
    fn cleanup_evicts_only_expired() {
        let cache = ResolutionCache::new(1);
        cache.put("alice.example".into(), sid(), 1000);
        cache.put("bob.example".into(), sid(), 5000);
        cache.cleanup(5000);
        assert_eq!(cache.len(), 1);
    }
}
