//! Atomic, concurrent-safe persistence of per-SID archive bytes plus
//! metadata, with TTL checks (§4.1).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ar_domain::{CacheMetadata, Error, Result};
use tokio::sync::Mutex as AsyncMutex;

use crate::paths;

/// Per-SID mutex map, same shape as a per-key session lock: a
/// `parking_lot::Mutex` guarding a `HashMap` of `Arc<tokio::sync::Mutex<()>>>`
/// so the outer map lock is never held across an `.await`.
pub struct CacheManager {
    root: PathBuf,
    locks: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CacheManager {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_root() -> Self {
        Self::new(paths::default_cache_root())
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn path_for(&self, sid: &str) -> Result<(PathBuf, PathBuf)> {
        paths::path_for(&self.root, sid)
    }

    fn lock_for(&self, sid: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(sid.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// True iff metadata exists for `sid` and `cached_at + ttl_hours` is
    /// still in the future.
    pub async fn is_valid(&self, sid: &str, ttl_hours: u64) -> bool {
        match self.read_metadata(sid).await {
            Ok(meta) => {
                let now = now_unix();
                now < meta.cached_at + (ttl_hours as i64) * 3600
            }
            Err(_) => false,
        }
    }

    pub async fn read_metadata(&self, sid: &str) -> Result<CacheMetadata> {
        let (_, meta_path) = self.path_for(sid)?;
        let data = tokio::fs::read(&meta_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("no cache entry for {sid}"))
            } else {
                Error::CacheError(e.to_string())
            }
        })?;
        serde_json::from_slice(&data)
            .map_err(|e| Error::CacheError(format!("corrupt cache metadata for {sid}: {e}")))
    }

    pub async fn read_bytes(&self, sid: &str) -> Result<Vec<u8>> {
        let (bytes_path, _) = self.path_for(sid)?;
        tokio::fs::read(&bytes_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("no cached archive for {sid}"))
            } else {
                Error::CacheError(e.to_string())
            }
        })
    }

    /// Persist `bytes` and `metadata` for `sid` atomically: both files are
    /// written to sibling temp files then renamed into place. Serialized
    /// per-SID so concurrent stores for the same SID don't interleave;
    /// stores for distinct SIDs never contend.
    pub async fn store(&self, sid: &str, bytes: &[u8], metadata: &CacheMetadata) -> Result<()> {
        let lock = self.lock_for(sid);
        let _guard = lock.lock().await;

        let (bytes_path, meta_path) = self.path_for(sid)?;
        let dir = bytes_path
            .parent()
            .expect("bytes_path always has a parent")
            .to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::CacheError(e.to_string()))?;

        let meta_json = serde_json::to_vec_pretty(metadata)
            .map_err(|e| Error::CacheError(format!("serializing cache metadata: {e}")))?;

        let bytes_owned = bytes.to_vec();
        let result = tokio::task::spawn_blocking(move || {
            write_atomic(&dir, &bytes_path, &bytes_owned).and_then(|_| {
                let dir = meta_path
                    .parent()
                    .expect("meta_path always has a parent")
                    .to_path_buf();
                write_atomic(&dir, &meta_path, &meta_json)
            })
        })
        .await
        .map_err(|e| Error::Internal(format!("cache store task panicked: {e}")))?;

        result.map_err(Error::CacheError)
    }

    /// Walk the cache tree and remove any SID directory whose metadata is
    /// expired under its own stored TTL. Per-entry read errors are
    /// logged and skipped, not propagated.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let root = self.root.clone();
        let now = now_unix();
        let removed = tokio::task::spawn_blocking(move || cleanup_expired_blocking(&root, now))
            .await
            .map_err(|e| Error::Internal(format!("cleanup task panicked: {e}")))?;
        Ok(removed)
    }
}

fn write_atomic(
    dir: &std::path::Path,
    dest: &std::path::Path,
    contents: &[u8],
) -> std::result::Result<(), String> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| e.to_string())?;
    std::io::Write::write_all(&mut tmp, contents).map_err(|e| e.to_string())?;
    tmp.as_file().sync_all().map_err(|e| e.to_string())?;
    tmp.persist(dest).map_err(|e| e.error.to_string())?;
    Ok(())
}

fn cleanup_expired_blocking(root: &std::path::Path, now: i64) -> usize {
    let mut removed = 0;
    let Ok(shards) = std::fs::read_dir(root) else {
        return 0;
    };
    for shard in shards.flatten() {
        let Ok(entries) = std::fs::read_dir(shard.path()) else {
            continue;
        };
        for entry in entries.flatten() {
            let meta_path = entry.path().join(paths::METADATA_FILENAME);
            let Ok(data) = std::fs::read(&meta_path) else {
                continue;
            };
            let Ok(meta) = serde_json::from_slice::<CacheMetadata>(&data) else {
                tracing::warn!(path = %meta_path.display(), "skipping unreadable cache metadata");
                continue;
            };
            if !meta.is_valid_at(now) {
                if std::fs::remove_dir_all(entry.path()).is_ok() {
                    removed += 1;
                } else {
                    tracing::warn!(path = %entry.path().display(), "failed to remove expired cache entry");
                }
            }
        }
    }
    removed
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (CacheManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (CacheManager::new(dir.path().to_path_buf()), dir)
    }

    #[tokio::test]
    async fn store_then_read_round_trips() {
        let (mgr, _dir) = manager();
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        let meta = CacheMetadata::new(sid.into(), 24, now_unix());
        mgr.store(sid, b"archive-bytes", &meta).await.unwrap();

        let bytes = mgr.read_bytes(sid).await.unwrap();
        assert_eq!(bytes, b"archive-bytes");
        let read_meta = mgr.read_metadata(sid).await.unwrap();
        assert_eq!(read_meta.sid, sid);
    }

    #[tokio::test]
    async fn is_valid_respects_ttl() {
        let (mgr, _dir) = manager();
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        let stale_cached_at = now_unix() - 25 * 3600;
        let meta = CacheMetadata::new(sid.into(), 24, stale_cached_at);
        mgr.store(sid, b"bytes", &meta).await.unwrap();

        assert!(!mgr.is_valid(sid, 24).await);
        assert!(mgr.is_valid(sid, 48).await);
    }

    #[tokio::test]
    async fn missing_sid_is_not_found() {
        let (mgr, _dir) = manager();
        let err = mgr.read_bytes("did:plc:missingmissingmissing12").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        let err = mgr
            .read_metadata("did:plc:missingmissingmissing12")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn store_overwrites_atomically() {
        let (mgr, _dir) = manager();
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        let meta1 = CacheMetadata::new(sid.into(), 24, now_unix());
        mgr.store(sid, b"first", &meta1).await.unwrap();
        let meta2 = CacheMetadata::new(sid.into(), 24, now_unix());
        mgr.store(sid, b"second-longer", &meta2).await.unwrap();

        let bytes = mgr.read_bytes(sid).await.unwrap();
        assert_eq!(bytes, b"second-longer");
    }

    #[tokio::test]
    async fn cleanup_expired_removes_stale_entries_only() {
        let (mgr, _dir) = manager();
        let fresh = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        let stale = "did:plc:tkclowjfzkkkz35qb4qkes2k";

        let fresh_meta = CacheMetadata::new(fresh.into(), 24, now_unix());
        mgr.store(fresh, b"fresh", &fresh_meta).await.unwrap();

        let stale_meta = CacheMetadata::new(stale.into(), 1, now_unix() - 2 * 3600);
        mgr.store(stale, b"stale", &stale_meta).await.unwrap();

        let removed = mgr.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(mgr.read_bytes(fresh).await.is_ok());
        assert!(mgr.read_bytes(stale).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_stores_for_same_sid_do_not_corrupt_state() {
        let (mgr, _dir) = manager();
        let mgr = Arc::new(mgr);
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let mgr = mgr.clone();
            let sid = sid.to_string();
            handles.push(tokio::spawn(async move {
                let meta = CacheMetadata::new(sid.clone(), 24, now_unix());
                let bytes = vec![i; 16];
                mgr.store(&sid, &bytes, &meta).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Whatever the last writer left behind, bytes and metadata agree
        // in length and the read succeeds cleanly.
        let bytes = mgr.read_bytes(sid).await.unwrap();
        assert_eq!(bytes.len(), 16);
        assert!(bytes.iter().all(|b| *b == bytes[0]));
    }
}
