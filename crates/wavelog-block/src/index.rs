use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use wavelog_types::SegmentId;

use crate::block::{Block, BlockId, Fragment, FragmentKind};
use crate::error::{BlockError, BlockResult};

const INDEX_MAGIC: &[u8; 4] = b"WIDX";
const INDEX_FORMAT_VERSION: u32 = 1;

/// A version range held by one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub start_version: u64,
    pub end_version: u64,
    pub block_id: BlockId,
}

impl VersionRange {
    /// Whether the half-open `[start, end)` span contains `version`.
    pub fn contains(&self, version: u64) -> bool {
        self.start_version <= version && version < self.end_version
    }
}

/// Per-block bookkeeping tracked by the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Greatest end version among the block's fragments.
    pub last_modified_version: u64,
    /// Current size of the block file in bytes.
    pub size_bytes: u64,
}

/// Maps segment/version ranges to the block id(s) holding them.
///
/// The only mutable structure in the store: always read and written under
/// the store's single-writer discipline, updated atomically alongside each
/// append, and rebuilt wholesale when snapshots are remade or the durable
/// copy is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndex {
    /// Delta ranges keyed by end version (ranges are contiguous and
    /// non-overlapping, so the end version is a unique key).
    deltas: BTreeMap<u64, VersionRange>,
    /// Snapshot ladder: checkpoint version to the holding block.
    snapshots: BTreeMap<u64, BlockId>,
    /// Segment data ranges per segment id.
    segments: BTreeMap<SegmentId, Vec<VersionRange>>,
    /// Bookkeeping for every block in the store.
    blocks: BTreeMap<BlockId, BlockMeta>,
    /// The block currently receiving appends, if any.
    current_block: Option<BlockId>,
    last_modified_version: u64,
    last_modified_time_ms: u64,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole index from materialized blocks (recovery path).
    pub fn rebuild<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Self {
        let mut index = Self::new();
        for block in blocks {
            for fragment in block.fragments() {
                index.record_fragment(block.id(), fragment, block.header().size_bytes, 0);
            }
            // A block may be empty of fragments but still occupy space.
            index
                .blocks
                .entry(block.id())
                .or_insert(BlockMeta {
                    last_modified_version: 0,
                    size_bytes: block.header().size_bytes,
                })
                .size_bytes = block.header().size_bytes;
            index.current_block = Some(index.current_block.map_or(block.id(), |c| c.max(block.id())));
        }
        index
    }

    /// `true` iff no delta has ever been recorded.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn last_modified_version(&self) -> u64 {
        self.last_modified_version
    }

    pub fn last_modified_time_ms(&self) -> u64 {
        self.last_modified_time_ms
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn block_meta(&self, id: BlockId) -> Option<&BlockMeta> {
        self.blocks.get(&id)
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Record a fragment appended to `block_id`, updating all range maps
    /// and the block's bookkeeping in one step.
    pub fn record_fragment(
        &mut self,
        block_id: BlockId,
        fragment: &Fragment,
        block_size_bytes: u64,
        time_ms: u64,
    ) {
        let range = VersionRange {
            start_version: fragment.start_version,
            end_version: fragment.end_version,
            block_id,
        };
        match &fragment.kind {
            FragmentKind::Delta => {
                self.deltas.insert(fragment.end_version, range);
            }
            FragmentKind::Snapshot => {
                self.snapshots.insert(fragment.start_version, block_id);
            }
            FragmentKind::Segment(segment) => {
                self.segments.entry(segment.clone()).or_default().push(range);
            }
        }

        let meta = self.blocks.entry(block_id).or_default();
        meta.size_bytes = block_size_bytes;
        meta.last_modified_version = meta.last_modified_version.max(fragment.end_version);

        if fragment.end_version >= self.last_modified_version {
            self.last_modified_version = fragment.end_version;
            self.last_modified_time_ms = time_ms;
        }
        self.current_block = Some(block_id);
    }

    /// The most recently appended delta range, if any.
    pub fn last_delta(&self) -> Option<VersionRange> {
        self.deltas.values().next_back().copied()
    }

    /// The block whose size is still below the low-water threshold, or
    /// `None` if a fresh block must be allocated. A block at or above the
    /// threshold is never returned.
    pub fn writable_block(&self, low_water_bytes: u64) -> Option<BlockId> {
        let current = self.current_block?;
        let meta = self.blocks.get(&current)?;
        (meta.size_bytes < low_water_bytes).then_some(current)
    }

    /// The id the next allocated block will get.
    pub fn next_block_id(&self) -> BlockId {
        self.blocks
            .keys()
            .next_back()
            .map(BlockId::next)
            .unwrap_or(BlockId(0))
    }

    // ---- delta range resolution ----

    /// The delta range ending exactly at `version`.
    pub fn delta_by_end_version(&self, version: u64) -> Option<VersionRange> {
        self.deltas.get(&version).copied()
    }

    /// The delta range starting exactly at `version`.
    pub fn delta_by_start_version(&self, version: u64) -> Option<VersionRange> {
        // Ranges are contiguous: the range starting at v is the first one
        // ending strictly after v.
        self.deltas
            .range((Bound::Excluded(version), Bound::Unbounded))
            .next()
            .map(|(_, range)| *range)
            .filter(|range| range.start_version == version)
    }

    /// The delta range whose `[start, end)` span contains `version`.
    pub fn delta_containing(&self, version: u64) -> Option<VersionRange> {
        self.deltas
            .range((Bound::Excluded(version), Bound::Unbounded))
            .next()
            .map(|(_, range)| *range)
            .filter(|range| range.contains(version))
    }

    /// The delta "passing by or leading to" `version`: the range ending
    /// exactly at `version` when one exists, else the range containing it.
    pub fn delta_by_arbitrary_version(&self, version: u64) -> Option<VersionRange> {
        self.delta_by_end_version(version)
            .or_else(|| self.delta_containing(version))
    }

    /// Delta ranges from `version` onward, in version order. Includes the
    /// range containing `version` when it falls mid-span.
    pub fn deltas_from(&self, version: u64) -> impl Iterator<Item = VersionRange> + '_ {
        self.deltas
            .range((Bound::Excluded(version), Bound::Unbounded))
            .map(|(_, range)| *range)
    }

    // ---- snapshot ladder ----

    /// The greatest checkpoint version at or below `version`.
    pub fn nearest_snapshot(&self, version: u64) -> Option<(u64, BlockId)> {
        self.snapshots
            .range(..=version)
            .next_back()
            .map(|(v, id)| (*v, *id))
    }

    /// The block holding the snapshot at exactly `version`.
    pub fn snapshot_at(&self, version: u64) -> Option<BlockId> {
        self.snapshots.get(&version).copied()
    }

    pub fn snapshot_versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.snapshots.keys().copied()
    }

    /// Drop the whole snapshot ladder (remake path).
    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }

    // ---- segment ranges ----

    /// Ranges recorded for a segment, in append order.
    pub fn segment_ranges(&self, segment: &SegmentId) -> &[VersionRange] {
        self.segments.get(segment).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The block holding the segment data whose span contains `version`.
    pub fn segment_block_containing(&self, segment: &SegmentId, version: u64) -> Option<BlockId> {
        self.segments.get(segment).and_then(|ranges| {
            ranges
                .iter()
                .find(|r| r.contains(version) || r.end_version == version)
                .map(|r| r.block_id)
        })
    }

    // ---- serialization ----

    /// Serialize with magic, format version, and a CRC-protected payload.
    pub fn to_bytes(&self) -> BlockResult<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| BlockError::Serialization(e.to_string()))?;
        let mut buf = Vec::with_capacity(payload.len() + 16);
        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_FORMAT_VERSION.to_be_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> BlockResult<Self> {
        if data.len() < 16 {
            return Err(BlockError::IndexCorrupted("too short".into()));
        }
        if &data[0..4] != INDEX_MAGIC {
            return Err(BlockError::InvalidMagic {
                expected: String::from_utf8_lossy(INDEX_MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes(data[4..8].try_into().expect("sliced 4 bytes"));
        if version != INDEX_FORMAT_VERSION {
            return Err(BlockError::UnsupportedVersion(version));
        }
        let length = u32::from_le_bytes(data[8..12].try_into().expect("sliced 4 bytes")) as usize;
        let expected_crc = u32::from_le_bytes(data[12..16].try_into().expect("sliced 4 bytes"));
        let payload = data
            .get(16..16 + length)
            .ok_or_else(|| BlockError::IndexCorrupted("truncated payload".into()))?;
        if crc32fast::hash(payload) != expected_crc {
            return Err(BlockError::IndexCorrupted("CRC mismatch".into()));
        }
        bincode::deserialize(payload).map_err(|e| BlockError::IndexCorrupted(e.to_string()))
    }
}
