//! Archive Reader (§4.5): decodes CAR v1 framing into a lazy sequence of
//! `(content_address, payload_bytes)` pairs.
//!
//! Framing is exactly the CAR v1 format — a varint-prefixed CBOR header
//! naming the roots, then varint-prefixed `(cid, payload)` blocks — so
//! the reader is a thin, faithful wrapper over `iroh_car::CarReader`
//! rather than a hand-rolled parser.

use std::io::Cursor;

use ar_domain::{Error, Result};
use cid::Cid;
use iroh_car::CarReader;

/// One block of the archive: its content address and opaque payload.
pub struct Block {
    pub cid: Cid,
    pub bytes: Vec<u8>,
}

/// Wraps a `CarReader` over the full archive bytes held in memory (the
/// Cache Manager already holds the whole archive on disk; this reader
/// streams blocks out of it one at a time rather than materializing a
/// second parsed copy).
pub struct ArchiveReader {
    inner: CarReader<Cursor<Vec<u8>>>,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader").finish_non_exhaustive()
    }
}

impl ArchiveReader {
    pub async fn open(bytes: Vec<u8>) -> Result<Self> {
        let inner = CarReader::new(Cursor::new(bytes))
            .await
            .map_err(|e| Error::RepoParseFailed(format!("invalid archive framing: {e}")))?;
        Ok(Self { inner })
    }

    /// The archive's declared roots (the commit block is the first one).
    pub fn roots(&self) -> Vec<Cid> {
        self.inner.header().roots().to_vec()
    }

    /// Yield the next block, or `None` at end of stream. Does not buffer
    /// more than the current block in memory beyond what `iroh_car`
    /// itself retains as read-ahead.
    pub async fn next_block(&mut self) -> Result<Option<Block>> {
        match self.inner.next_block().await {
            Ok(Some((cid, bytes))) => Ok(Some(Block { cid, bytes })),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::RepoParseFailed(format!(
                "corrupt archive framing: {e}"
            ))),
        }
    }

    /// Drain the remaining blocks into a `cid → payload` map. Bounded by
    /// archive size, as the Tree Walker requires random access to
    /// reconstruct the MST.
    pub async fn load_all_blocks(
        mut self,
    ) -> Result<(Vec<Cid>, std::collections::HashMap<Cid, Vec<u8>>)> {
        let roots = self.roots();
        let mut blocks = std::collections::HashMap::new();
        while let Some(block) = self.next_block().await? {
            blocks.insert(block.cid, block.bytes);
        }
        Ok((roots, blocks))
    }
}
