use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use wavelog_block::{BlockStore, Fragment};
use wavelog_delta::{DeltaLogReader, DeltaRecord};
use wavelog_ops::WaveletState;
use wavelog_types::WaveletName;

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::WaveletSnapshot;

/// Read access to one wavelet's snapshot ladder.
pub trait SnapshotReader: Send + Sync {
    /// The materialized state at version 0. Fails with `NotFound` when no
    /// initial snapshot has been written.
    fn read_initial_snapshot(&self) -> SnapshotResult<WaveletSnapshot>;

    /// The snapshot at the greatest checkpoint version at or below
    /// `version`, if any.
    fn read_nearest_snapshot(&self, version: u64) -> SnapshotResult<Option<WaveletSnapshot>>;
}

/// Write access to one wavelet's snapshot ladder. All writes are blocking;
/// callers must not assume background completion.
pub trait SnapshotWriter: Send + Sync {
    /// Persist the version-0 snapshot.
    fn write_initial_snapshot(&self, snapshot: &WaveletSnapshot) -> SnapshotResult<()>;

    /// Persist a checkpoint snapshot into the ladder.
    fn write_snapshot_to_history(&self, snapshot: &WaveletSnapshot) -> SnapshotResult<()>;

    /// Rebuild the whole ladder by replaying the full delta log, emitting
    /// a snapshot every `period` applied operations. Exclusive: no other
    /// snapshot write may overlap it.
    fn remake_snapshots_history(
        &self,
        deltas: &dyn DeltaLogReader,
        period: usize,
    ) -> SnapshotResult<()>;
}

/// Snapshot ladder backed by a per-wavelet block store.
pub struct FileSnapshotStore {
    wavelet: WaveletName,
    store: Arc<BlockStore>,
    /// Serializes all snapshot writes, including remakes.
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(wavelet: WaveletName, store: Arc<BlockStore>) -> Self {
        Self {
            wavelet,
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn wavelet(&self) -> &WaveletName {
        &self.wavelet
    }

    /// Prove that nearest-snapshot-plus-tail reconstruction at `version`
    /// matches a full replay from genesis, returning the converged state.
    pub fn verify_snapshot_convergence(
        &self,
        deltas: &dyn DeltaLogReader,
        version: u64,
    ) -> SnapshotResult<WaveletState> {
        let mut from_genesis = WaveletState::new();
        replay_onto(&mut from_genesis, deltas, 0, version)?;

        let from_checkpoint = match self.read_nearest_snapshot(version)? {
            Some(snapshot) => {
                let checkpoint = snapshot.version().version();
                let mut state = snapshot.into_state();
                replay_onto(&mut state, deltas, checkpoint, version)?;
                state
            }
            None => {
                let mut state = WaveletState::new();
                replay_onto(&mut state, deltas, 0, version)?;
                state
            }
        };
        if from_genesis != from_checkpoint {
            warn!(version, "snapshot reconstruction diverged from full replay");
            return Err(SnapshotError::Divergence { version });
        }
        Ok(from_checkpoint)
    }

    fn read_snapshot_at(&self, version: u64) -> SnapshotResult<Option<WaveletSnapshot>> {
        let index = self.store.index();
        let Some(block_id) = index.snapshot_at(version) else {
            return Ok(None);
        };
        let mut blocks = self.store.read_blocks(&[block_id]).wait()?;
        let block = blocks.remove(&block_id).ok_or_else(|| {
            SnapshotError::Storage(wavelog_block::BlockError::NotFound(format!("{block_id}")))
        })?;
        let fragment = block.snapshot_at(version).ok_or_else(|| {
            SnapshotError::Serialization(format!(
                "index references snapshot at {version} missing from {}",
                block.id()
            ))
        })?;
        let snapshot = bincode::deserialize(&fragment.payload)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        Ok(Some(snapshot))
    }

    fn persist(&self, snapshot: &WaveletSnapshot) -> SnapshotResult<()> {
        let payload = bincode::serialize(snapshot)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        let fragment = Fragment::snapshot(snapshot.version().version(), payload);
        self.store.write_fragment(fragment)?;
        debug!(
            wavelet = %self.wavelet,
            version = snapshot.version().version(),
            "wrote snapshot"
        );
        Ok(())
    }
}

impl SnapshotReader for FileSnapshotStore {
    fn read_initial_snapshot(&self) -> SnapshotResult<WaveletSnapshot> {
        self.read_snapshot_at(0)?.ok_or_else(|| {
            SnapshotError::NotFound(format!("initial snapshot of {}", self.wavelet))
        })
    }

    fn read_nearest_snapshot(&self, version: u64) -> SnapshotResult<Option<WaveletSnapshot>> {
        let index = self.store.index();
        let Some((checkpoint, _)) = index.nearest_snapshot(version) else {
            return Ok(None);
        };
        self.read_snapshot_at(checkpoint)
    }
}

impl SnapshotWriter for FileSnapshotStore {
    fn write_initial_snapshot(&self, snapshot: &WaveletSnapshot) -> SnapshotResult<()> {
        if !snapshot.is_initial() {
            return Err(SnapshotError::NotInitial(snapshot.version().version()));
        }
        let _write = self.write_lock.lock().expect("snapshot write lock poisoned");
        self.persist(snapshot)
    }

    fn write_snapshot_to_history(&self, snapshot: &WaveletSnapshot) -> SnapshotResult<()> {
        let _write = self.write_lock.lock().expect("snapshot write lock poisoned");
        self.persist(snapshot)
    }

    fn remake_snapshots_history(
        &self,
        deltas: &dyn DeltaLogReader,
        period: usize,
    ) -> SnapshotResult<()> {
        if period == 0 {
            return Err(SnapshotError::InvalidPeriod(period));
        }
        let _write = self.write_lock.lock().expect("snapshot write lock poisoned");
        debug!(wavelet = %self.wavelet, period, "remaking snapshot history");

        self.store.clear_snapshot_index()?;
        self.persist(&WaveletSnapshot::initial(self.wavelet.clone(), now_ms()))?;

        let mut state = WaveletState::new();
        let mut ops_since_checkpoint = 0usize;
        let mut result = Ok(());
        deltas.for_each_delta_from(0, &mut |record| {
            if let Err(err) = apply_record(&mut state, record) {
                result = Err(err);
                return Ok(false);
            }
            ops_since_checkpoint += record.op_count();
            if ops_since_checkpoint >= period {
                let snapshot = WaveletSnapshot::at(
                    self.wavelet.clone(),
                    *record.resulting_version(),
                    now_ms(),
                    state.clone(),
                );
                if let Err(err) = self.persist(&snapshot) {
                    result = Err(err);
                    return Ok(false);
                }
                ops_since_checkpoint = 0;
            }
            Ok(true)
        })?;
        result
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn apply_record(state: &mut WaveletState, record: &DeltaRecord) -> SnapshotResult<()> {
    for op in record.ops() {
        op.apply(state)?;
    }
    state.set_last_modified(*record.resulting_version(), record.applied_at_ms());
    Ok(())
}

/// Apply every delta with a resulting version in `(from, to]` onto
/// `state`, stopping as soon as `to` is reached.
pub fn replay_onto(
    state: &mut WaveletState,
    deltas: &dyn DeltaLogReader,
    from: u64,
    to: u64,
) -> SnapshotResult<()> {
    let mut result = Ok(());
    deltas.for_each_delta_from(from, &mut |record| {
        if record.resulting_version().version() > to {
            return Ok(false);
        }
        if let Err(err) = apply_record(state, record) {
            result = Err(err);
            return Ok(false);
        }
        Ok(record.resulting_version().version() < to)
    })?;
    result
}
