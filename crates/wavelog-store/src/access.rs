use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use wavelog_block::{BlockStore, BlockStoreConfig};
use wavelog_delta::{DeltaLogReader, DeltaLogWriter, DeltaReceiver, DeltaRecord, FileDeltaLog};
use wavelog_ops::WaveletState;
use wavelog_snapshot::{
    replay_onto, FileSnapshotStore, SnapshotReader, SnapshotWriter, WaveletSnapshot,
};
use wavelog_types::{HashedVersion, Status, WaveletName};

/// One opened wavelet: its delta log, snapshot ladder, and the block
/// store both are backed by. Every failure crosses this boundary as a
/// uniform [`Status`].
pub struct WaveletAccess {
    name: WaveletName,
    blocks: Arc<BlockStore>,
    deltas: FileDeltaLog,
    snapshots: FileSnapshotStore,
    snapshot_period_ops: usize,
}

impl WaveletAccess {
    pub(crate) fn open(
        name: WaveletName,
        dir: &Path,
        block_config: BlockStoreConfig,
        snapshot_period_ops: usize,
    ) -> Result<Self, Status> {
        let blocks = Arc::new(if dir.is_dir() {
            BlockStore::open(dir, block_config)?
        } else {
            BlockStore::create(dir, block_config)?
        });
        let deltas = FileDeltaLog::open(Arc::clone(&blocks))?;
        let snapshots = FileSnapshotStore::new(name.clone(), Arc::clone(&blocks));
        debug!(wavelet = %name, "opened wavelet");
        Ok(Self {
            name,
            blocks,
            deltas,
            snapshots,
            snapshot_period_ops,
        })
    }

    pub fn name(&self) -> &WaveletName {
        &self.name
    }

    // ---- delta log ----

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn last_modified_version(&self) -> HashedVersion {
        self.deltas.last_modified_version()
    }

    pub fn last_modified_time_ms(&self) -> u64 {
        self.deltas.last_modified_time_ms()
    }

    /// Append an ordered batch of deltas, returning the new head version.
    /// The batch is applied in order; the first failure stops the batch
    /// with earlier deltas already durable.
    pub fn append(&self, deltas: Vec<DeltaRecord>) -> Result<HashedVersion, Status> {
        let mut head = self.deltas.last_modified_version();
        for delta in deltas {
            head = self.deltas.append(delta)?;
        }
        Ok(head)
    }

    pub fn delta_by_start_version(&self, version: u64) -> Result<Option<DeltaRecord>, Status> {
        Ok(self.deltas.delta_by_start_version(version)?)
    }

    pub fn delta_by_end_version(&self, version: u64) -> Result<Option<DeltaRecord>, Status> {
        Ok(self.deltas.delta_by_end_version(version)?)
    }

    pub fn delta_by_arbitrary_version(&self, version: u64) -> Result<Option<DeltaRecord>, Status> {
        Ok(self.deltas.delta_by_arbitrary_version(version)?)
    }

    /// Stream deltas from `version` onward to `receiver`; the receiver's
    /// boolean return is the sole cancellation mechanism.
    pub fn for_each_delta_from(
        &self,
        version: u64,
        receiver: &mut DeltaReceiver<'_>,
    ) -> Result<(), Status> {
        Ok(self.deltas.for_each_delta_from(version, receiver)?)
    }

    /// Verify version contiguity and the hash chain over the whole log.
    pub fn validate_history(&self) -> Result<HashedVersion, Status> {
        Ok(self.deltas.validate_history()?)
    }

    // ---- snapshots ----

    pub fn read_initial_snapshot(&self) -> Result<WaveletSnapshot, Status> {
        Ok(self.snapshots.read_initial_snapshot()?)
    }

    pub fn read_nearest_snapshot(&self, version: u64) -> Result<Option<WaveletSnapshot>, Status> {
        Ok(self.snapshots.read_nearest_snapshot(version)?)
    }

    pub fn write_initial_snapshot(&self, snapshot: &WaveletSnapshot) -> Result<(), Status> {
        Ok(self.snapshots.write_initial_snapshot(snapshot)?)
    }

    pub fn write_snapshot_to_history(&self, snapshot: &WaveletSnapshot) -> Result<(), Status> {
        Ok(self.snapshots.write_snapshot_to_history(snapshot)?)
    }

    /// Rebuild the snapshot ladder from the delta log at the configured
    /// checkpoint period.
    pub fn remake_snapshots_history(&self) -> Result<(), Status> {
        Ok(self
            .snapshots
            .remake_snapshots_history(&self.deltas, self.snapshot_period_ops)?)
    }

    /// Materialize the wavelet state at `version` from the nearest
    /// checkpoint plus the tail of deltas up to `version`.
    pub fn state_at(&self, version: u64) -> Result<WaveletState, Status> {
        match self.snapshots.read_nearest_snapshot(version)? {
            Some(snapshot) => {
                let checkpoint = snapshot.version().version();
                let mut state = snapshot.into_state();
                replay_onto(&mut state, &self.deltas, checkpoint, version)
                    .map_err(Status::from)?;
                Ok(state)
            }
            None => {
                let mut state = WaveletState::new();
                replay_onto(&mut state, &self.deltas, 0, version).map_err(Status::from)?;
                Ok(state)
            }
        }
    }

    // ---- underlying stores ----

    pub fn delta_log(&self) -> &FileDeltaLog {
        &self.deltas
    }

    pub fn snapshot_store(&self) -> &FileSnapshotStore {
        &self.snapshots
    }

    pub fn block_store(&self) -> &Arc<BlockStore> {
        &self.blocks
    }
}
