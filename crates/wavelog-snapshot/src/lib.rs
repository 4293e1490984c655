//! Snapshot ladder for wavelet histories.
//!
//! Snapshots materialize a wavelet's state at checkpoint versions so
//! readers replay only the tail of deltas between the nearest checkpoint
//! and the version they want, instead of the whole log. The ladder can be
//! rebuilt from scratch by replaying the delta log and emitting a
//! checkpoint at a fixed operation period.

pub mod error;
pub mod snapshot;
pub mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::WaveletSnapshot;
pub use store::{replay_onto, FileSnapshotStore, SnapshotReader, SnapshotWriter};
