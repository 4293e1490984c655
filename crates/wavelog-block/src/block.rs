use std::fmt;

use serde::{Deserialize, Serialize};
use wavelog_types::SegmentId;

/// Identifier of a block within one wavelet's store. Allocated
/// monotonically; block 0 is the first block ever written.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub u64);

impl BlockId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The next block id in allocation order.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block-{:06}", self.0)
    }
}

/// What a fragment's payload contains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    /// A serialized delta record.
    Delta,
    /// A serialized wavelet snapshot at a checkpoint version.
    Snapshot,
    /// Serialized data of one segment.
    Segment(SegmentId),
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delta => write!(f, "delta"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Segment(id) => write!(f, "segment:{id}"),
        }
    }
}

/// One serialized unit stored inside a block.
///
/// Delta fragments span `[start_version, end_version)`; snapshot fragments
/// carry `start_version == end_version == checkpoint version`. The payload
/// is the uncompressed serialized record; compression happens at the frame
/// level when the fragment is written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub start_version: u64,
    pub end_version: u64,
    pub payload: Vec<u8>,
}

impl Fragment {
    pub fn delta(start_version: u64, end_version: u64, payload: Vec<u8>) -> Self {
        Self {
            kind: FragmentKind::Delta,
            start_version,
            end_version,
            payload,
        }
    }

    pub fn snapshot(version: u64, payload: Vec<u8>) -> Self {
        Self {
            kind: FragmentKind::Snapshot,
            start_version: version,
            end_version: version,
            payload,
        }
    }

    pub fn segment(segment: SegmentId, start_version: u64, end_version: u64, payload: Vec<u8>) -> Self {
        Self {
            kind: FragmentKind::Segment(segment),
            start_version,
            end_version,
            payload,
        }
    }

    /// Whether a delta fragment's `[start, end)` span contains `version`.
    pub fn contains_version(&self, version: u64) -> bool {
        self.start_version <= version && version < self.end_version
    }
}

/// Immutable metadata of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_id: BlockId,
    /// Greatest end version across the block's fragments.
    pub last_modified_version: u64,
    /// Size of the block file in bytes.
    pub size_bytes: u64,
}

/// A materialized block: header plus the fragments recovered from its
/// file. Persisted fragments never change; the current block may gain
/// fragments at its tail until it reaches the low-water threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    header: BlockHeader,
    fragments: Vec<Fragment>,
}

impl Block {
    pub fn new(header: BlockHeader, fragments: Vec<Fragment>) -> Self {
        Self { header, fragments }
    }

    pub fn id(&self) -> BlockId {
        self.header.block_id
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// The delta fragment ending exactly at `version`, if present.
    pub fn delta_by_end_version(&self, version: u64) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.kind == FragmentKind::Delta && f.end_version == version)
    }

    /// The delta fragment starting exactly at `version`, if present.
    pub fn delta_by_start_version(&self, version: u64) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.kind == FragmentKind::Delta && f.start_version == version)
    }

    /// The delta fragment whose `[start, end)` span contains `version`.
    pub fn delta_containing(&self, version: u64) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.kind == FragmentKind::Delta && f.contains_version(version))
    }

    /// The snapshot fragment at exactly `version`, if present.
    pub fn snapshot_at(&self, version: u64) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.kind == FragmentKind::Snapshot && f.start_version == version)
    }

    /// All delta fragments, in file order (which is version order for a
    /// correctly-written log).
    pub fn delta_fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::Delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_deltas() -> Block {
        let fragments = vec![
            Fragment::delta(0, 2, b"d0".to_vec()),
            Fragment::delta(2, 3, b"d1".to_vec()),
            Fragment::snapshot(3, b"s3".to_vec()),
        ];
        Block::new(
            BlockHeader {
                block_id: BlockId(0),
                last_modified_version: 3,
                size_bytes: 64,
            },
            fragments,
        )
    }

    #[test]
    fn block_id_display_and_next() {
        assert_eq!(format!("{}", BlockId(7)), "block-000007");
        assert_eq!(BlockId(7).next(), BlockId(8));
    }

    #[test]
    fn delta_lookup_by_end_version() {
        let block = block_with_deltas();
        assert_eq!(block.delta_by_end_version(2).unwrap().payload, b"d0");
        assert!(block.delta_by_end_version(1).is_none());
    }

    #[test]
    fn delta_lookup_by_start_version() {
        let block = block_with_deltas();
        assert_eq!(block.delta_by_start_version(2).unwrap().payload, b"d1");
        assert!(block.delta_by_start_version(1).is_none());
    }

    #[test]
    fn delta_containing_uses_half_open_span() {
        let block = block_with_deltas();
        assert_eq!(block.delta_containing(0).unwrap().payload, b"d0");
        assert_eq!(block.delta_containing(1).unwrap().payload, b"d0");
        assert_eq!(block.delta_containing(2).unwrap().payload, b"d1");
        assert!(block.delta_containing(3).is_none());
    }

    #[test]
    fn snapshot_lookup_ignores_deltas() {
        let block = block_with_deltas();
        assert_eq!(block.snapshot_at(3).unwrap().payload, b"s3");
        assert!(block.snapshot_at(2).is_none());
    }

    #[test]
    fn fragment_serde_roundtrip() {
        let fragment = Fragment::segment(
            SegmentId::of_blip_id("b1").unwrap(),
            4,
            7,
            b"segment data".to_vec(),
        );
        let bytes = bincode::serialize(&fragment).unwrap();
        let parsed: Fragment = bincode::deserialize(&bytes).unwrap();
        assert_eq!(fragment, parsed);
    }
}
