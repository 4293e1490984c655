//! Block-structured append-only storage for wavelet histories.
//!
//! Each wavelet owns a directory of size-bounded block files plus a durable
//! index mapping version ranges to the blocks holding them. Fragments
//! (serialized deltas, snapshots, and segment data) are CRC-framed and
//! zstd-compressed on disk. Reads go through [`BlockStore::read_blocks`],
//! which coalesces concurrent requests for the same block into one load
//! shared by every caller.

pub mod block;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod store;

pub use block::{Block, BlockHeader, BlockId, Fragment, FragmentKind};
pub use config::BlockStoreConfig;
pub use error::{BlockError, BlockResult};
pub use fetch::Fetch;
pub use index::{BlockIndex, BlockMeta, VersionRange};
pub use store::BlockStore;
