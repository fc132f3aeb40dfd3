//! Tree Walker (§4.6): reconstructs `content_address → rkey` for one
//! collection from the repository's signed commit and Merkle Search
//! Tree blocks.

use std::collections::{HashMap, HashSet};

use ar_domain::{Error, Result};
use cid::Cid;
use serde::{de, Deserialize, Deserializer};

/// ATProto repo v3 signed commit. Only the fields the walker needs are
/// modeled; `sig` and `prev` are carried but unused.
#[derive(Debug, Deserialize)]
pub struct Commit {
    #[allow(dead_code)]
    pub did: String,
    #[allow(dead_code)]
    pub version: u32,
    pub data: Cid,
    #[allow(dead_code)]
    pub rev: String,
    #[allow(dead_code)]
    pub prev: Option<Cid>,
    #[allow(dead_code)]
    #[serde(with = "serde_bytes")]
    pub sig: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct MstNode {
    #[serde(rename = "l")]
    left: Option<Cid>,
    #[serde(rename = "e", default)]
    entries: Vec<MstEntry>,
}

#[derive(Debug, Deserialize)]
struct MstEntry {
    #[serde(rename = "p", deserialize_with = "deserialize_prefix_len")]
    prefix_len: usize,
    #[serde(rename = "k")]
    key_suffix: serde_bytes::ByteBuf,
    #[serde(rename = "v")]
    value: Option<Cid>,
    #[serde(rename = "t")]
    tree: Option<Cid>,
}

/// CBOR integers can decode as either signed or unsigned depending on
/// magnitude; accept both and clamp negatives to 0 (a negative prefix
/// length cannot occur in a well-formed tree).
fn deserialize_prefix_len<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = usize;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a non-negative integer")
        }
        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<usize, E> {
            Ok(v as usize)
        }
        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<usize, E> {
            Ok(v.max(0) as usize)
        }
    }
    deserializer.deserialize_any(Visitor)
}

const MAX_KEY_SUFFIX_LEN: usize = 512;

/// Walk the MST rooted at the commit's `data` pointer and return a map
/// from record content-address to rkey, scoped to `collection`. Every
/// record block reachable via the tree and belonging to `collection`
/// appears in the result; other collections are ignored, not errors.
pub fn walk_collection(
    blocks: &HashMap<Cid, Vec<u8>>,
    roots: &[Cid],
    collection: &str,
) -> Result<HashMap<Cid, String>> {
    let commit_cid = roots
        .first()
        .ok_or_else(|| Error::RepoParseFailed("archive has no roots".into()))?;
    let commit_data = blocks
        .get(commit_cid)
        .ok_or_else(|| Error::RepoParseFailed("commit block not found in archive".into()))?;
    let commit: Commit = decode_cbor(commit_data, "commit")?;

    let mut result = HashMap::new();
    let mut visited = HashSet::new();
    walk_node(&commit.data, blocks, "", collection, &mut result, &mut visited)?;
    Ok(result)
}

fn walk_node(
    node_cid: &Cid,
    blocks: &HashMap<Cid, Vec<u8>>,
    key_prefix: &str,
    collection: &str,
    result: &mut HashMap<Cid, String>,
    visited: &mut HashSet<Cid>,
) -> Result<()> {
    if !visited.insert(*node_cid) {
        return Err(Error::RepoParseFailed(format!(
            "cycle detected revisiting MST node {node_cid}"
        )));
    }

    let Some(data) = blocks.get(node_cid) else {
        tracing::warn!(cid = %node_cid, "MST node block not found, skipping subtree");
        return Ok(());
    };
    let node: MstNode = decode_cbor(data, "mst node")?;

    if let Some(left) = &node.left {
        walk_node(left, blocks, key_prefix, collection, result, visited)?;
    }

    let mut prev_key = key_prefix.to_string();
    for entry in &node.entries {
        if entry.key_suffix.len() > MAX_KEY_SUFFIX_LEN {
            tracing::warn!(
                len = entry.key_suffix.len(),
                "MST key suffix exceeds maximum length, skipping entry"
            );
            continue;
        }
        let suffix = String::from_utf8_lossy(&entry.key_suffix);
        let full_key = if entry.prefix_len > 0 && entry.prefix_len <= prev_key.len() {
            format!("{}{}", &prev_key[..entry.prefix_len], suffix)
        } else {
            suffix.to_string()
        };

        if let Some(value_cid) = &entry.value {
            if let Some((key_collection, rkey)) = full_key.split_once('/') {
                if key_collection == collection {
                    result.insert(*value_cid, rkey.to_string());
                }
            }
        }

        if let Some(tree) = &entry.tree {
            walk_node(tree, blocks, &full_key, collection, result, visited)?;
        }

        prev_key = full_key;
    }

    Ok(())
}

fn decode_cbor<T: de::DeserializeOwned>(data: &[u8], what: &str) -> Result<T> {
    serde_ipld_dagcbor::from_slice(data)
        .map_err(|e| Error::RepoParseFailed(format!("decoding {what}: {e}")))
}
