//! Cache root resolution and per-SID directory sharding (§4.1, §6 Boundary 3).

use std::path::{Path, PathBuf};

use ar_domain::{Error, Result};
use sha2::{Digest, Sha256};

pub const BYTES_FILENAME: &str = "repo.car";
pub const METADATA_FILENAME: &str = "metadata.json";

/// Default per-user cache root, e.g. `~/.cache/autoreply` on Linux.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("autoreply")
}

/// Two-character shard prefix derived from the SHA-256 of the SID, to
/// keep any single directory from growing unbounded.
pub fn shard_prefix(sid: &str) -> String {
    let digest = Sha256::digest(sid.as_bytes());
    hex::encode(&digest[..1])
}

/// `<root>/<pp>/<sid>/`
pub fn entry_dir(root: &Path, sid: &str) -> Result<PathBuf> {
    if sid.is_empty() {
        return Err(Error::InvalidInput("sid must not be empty".into()));
    }
    Ok(root.join(shard_prefix(sid)).join(sid))
}

/// `(bytes_path, metadata_path)` for a given SID.
pub fn path_for(root: &Path, sid: &str) -> Result<(PathBuf, PathBuf)> {
    let dir = entry_dir(root, sid)?;
    Ok((dir.join(BYTES_FILENAME), dir.join(METADATA_FILENAME)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_sid() {
        assert!(entry_dir(Path::new("/tmp/x"), "").is_err());
    }

    #[test]
    fn shard_prefix_is_two_hex_chars() {
        let p = shard_prefix("did:plc:5cajdgeo6qz32kptlpg4c3lv");
        assert_eq!(p.len(), 2);
        assert!(p.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn shard_prefix_is_deterministic() {
        let a = shard_prefix("did:plc:5cajdgeo6qz32kptlpg4c3lv");
        let b = shard_prefix("did:plc:5cajdgeo6qz32kptlpg4c3lv");
        assert_eq!(a, b);
    }

    #[test]
    fn path_for_nests_under_shard_and_sid() {
        let root = Path::new("/tmp/cache");
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        let (bytes_path, meta_path) = path_for(root, sid).unwrap();
        let pp = shard_prefix(sid);
        assert_eq!(
            bytes_path,
            root.join(&pp).join(sid).join(BYTES_FILENAME)
        );
        assert_eq!(meta_path, root.join(&pp).join(sid).join(METADATA_FILENAME));
    }
}
