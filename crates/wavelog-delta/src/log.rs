use std::sync::{Arc, RwLock};

use tracing::debug;
use wavelog_block::{Block, BlockId, BlockStore, Fragment, VersionRange};
use wavelog_types::HashedVersion;

use crate::error::{DeltaError, DeltaResult};
use crate::record::DeltaRecord;
use crate::traits::{DeltaLogReader, DeltaLogWriter, DeltaReceiver};

struct Head {
    version: HashedVersion,
    time_ms: u64,
}

/// Delta log backed by a per-wavelet block store.
///
/// Appends chain-validate against the in-memory head before any bytes are
/// written; the block store's append ordering then guarantees readers
/// never observe an index entry without its delta (or vice versa).
pub struct FileDeltaLog {
    store: Arc<BlockStore>,
    /// Cached log head; also serializes appends.
    head: RwLock<Head>,
}

impl FileDeltaLog {
    /// Open a log over `store`, reloading the head from the most recent
    /// delta on disk. An empty store yields an empty log.
    pub fn open(store: Arc<BlockStore>) -> DeltaResult<Self> {
        let head = match store.index().last_delta() {
            None => Head {
                version: HashedVersion::unsigned(0),
                time_ms: 0,
            },
            Some(range) => {
                let block = fetch_block(&store, range.block_id)?;
                let record = decode_record(&block, range)?;
                Head {
                    version: *record.resulting_version(),
                    time_ms: record.applied_at_ms(),
                }
            }
        };
        debug!(head = head.version.version(), "opened delta log");
        Ok(Self {
            store,
            head: RwLock::new(head),
        })
    }

    /// Verify version contiguity and the hash chain over the whole log,
    /// returning the final head version.
    pub fn validate_history(&self) -> DeltaResult<HashedVersion> {
        let mut prev = HashedVersion::unsigned(0);
        self.for_each_delta_from(0, &mut |record| {
            record.verify_link(&prev)?;
            prev = *record.resulting_version();
            Ok(true)
        })?;
        let head = self.head.read().expect("head lock poisoned");
        if prev != head.version {
            return Err(DeltaError::InvalidRecord(format!(
                "replayed head {} disagrees with cached head {}",
                prev.version(),
                head.version.version()
            )));
        }
        Ok(prev)
    }

    fn read_record(&self, range: VersionRange) -> DeltaResult<DeltaRecord> {
        let block = fetch_block(&self.store, range.block_id)?;
        decode_record(&block, range)
    }
}

impl DeltaLogReader for FileDeltaLog {
    fn is_empty(&self) -> bool {
        self.store.index().is_empty()
    }

    fn last_modified_version(&self) -> HashedVersion {
        self.head.read().expect("head lock poisoned").version
    }

    fn last_modified_time_ms(&self) -> u64 {
        self.head.read().expect("head lock poisoned").time_ms
    }

    fn delta_by_start_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>> {
        self.store
            .index()
            .delta_by_start_version(version)
            .map(|range| self.read_record(range))
            .transpose()
    }

    fn delta_by_end_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>> {
        self.store
            .index()
            .delta_by_end_version(version)
            .map(|range| self.read_record(range))
            .transpose()
    }

    fn delta_by_arbitrary_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>> {
        self.store
            .index()
            .delta_by_arbitrary_version(version)
            .map(|range| self.read_record(range))
            .transpose()
    }

    fn for_each_delta_from(
        &self,
        version: u64,
        receiver: &mut DeltaReceiver<'_>,
    ) -> DeltaResult<()> {
        let index = self.store.index();
        // Blocks are fetched lazily so stopping early skips the rest.
        let mut cached: Option<(BlockId, Arc<Block>)> = None;
        for range in index.deltas_from(version) {
            let block = match &cached {
                Some((id, block)) if *id == range.block_id => Arc::clone(block),
                _ => {
                    let block = fetch_block(&self.store, range.block_id)?;
                    cached = Some((range.block_id, Arc::clone(&block)));
                    block
                }
            };
            let record = decode_record(&block, range)?;
            if !receiver(&record)? {
                break;
            }
        }
        Ok(())
    }
}

impl DeltaLogWriter for FileDeltaLog {
    fn append(&self, delta: DeltaRecord) -> DeltaResult<HashedVersion> {
        let mut head = self.head.write().expect("head lock poisoned");
        delta.verify_link(&head.version)?;

        let payload =
            bincode::serialize(&delta).map_err(|e| DeltaError::Serialization(e.to_string()))?;
        let fragment = Fragment::delta(
            delta.start_version().version(),
            delta.resulting_version().version(),
            payload,
        );
        self.store.write_fragment(fragment)?;

        head.version = *delta.resulting_version();
        head.time_ms = delta.applied_at_ms();
        debug!(
            version = head.version.version(),
            ops = delta.op_count(),
            "appended delta"
        );
        Ok(head.version)
    }
}

fn fetch_block(store: &Arc<BlockStore>, id: BlockId) -> DeltaResult<Arc<Block>> {
    let mut blocks = store.read_blocks(&[id]).wait()?;
    blocks
        .remove(&id)
        .ok_or_else(|| DeltaError::Storage(wavelog_block::BlockError::NotFound(format!("{id}"))))
}

fn decode_record(block: &Block, range: VersionRange) -> DeltaResult<DeltaRecord> {
    let fragment = block.delta_by_end_version(range.end_version).ok_or_else(|| {
        DeltaError::InvalidRecord(format!(
            "index references delta ending at {} missing from {}",
            range.end_version,
            block.id()
        ))
    })?;
    bincode::deserialize(&fragment.payload).map_err(|e| DeltaError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelog_block::BlockStoreConfig;
    use wavelog_ops::WaveletOperation;
    use wavelog_types::SegmentId;

    fn open_log(dir: &std::path::Path) -> FileDeltaLog {
        let store = Arc::new(BlockStore::create(dir, BlockStoreConfig::default()).unwrap());
        FileDeltaLog::open(store).unwrap()
    }

    fn reopen_log(dir: &std::path::Path) -> FileDeltaLog {
        let store = Arc::new(BlockStore::open(dir, BlockStoreConfig::default()).unwrap());
        FileDeltaLog::open(store).unwrap()
    }

    fn ops(n: usize) -> Vec<WaveletOperation> {
        (0..n)
            .map(|i| WaveletOperation::AddSegment {
                segment: SegmentId::of_blip_id(&format!("b{i}")).unwrap(),
            })
            .collect()
    }

    fn append_chain(log: &FileDeltaLog, op_counts: &[usize]) -> Vec<DeltaRecord> {
        let mut prev = log.last_modified_version();
        let mut records = Vec::new();
        for (i, &count) in op_counts.iter().enumerate() {
            let record = DeltaRecord::new(prev, ops(count), 1_000 + i as u64).unwrap();
            prev = log.append(record.clone()).unwrap();
            records.push(record);
        }
        records
    }

    #[test]
    fn empty_log_reports_sentinels() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        assert!(log.is_empty());
        assert_eq!(log.last_modified_version(), HashedVersion::unsigned(0));
        assert_eq!(log.last_modified_time_ms(), 0);
        assert!(log.delta_by_end_version(0).unwrap().is_none());
        assert!(log.delta_by_arbitrary_version(0).unwrap().is_none());
    }

    #[test]
    fn append_advances_the_head() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        let records = append_chain(&log, &[1, 2]);
        assert!(!log.is_empty());
        assert_eq!(log.last_modified_version(), *records[1].resulting_version());
        assert_eq!(log.last_modified_time_ms(), 1_001);
    }

    #[test]
    fn exact_version_lookups_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        let records = append_chain(&log, &[1, 2, 1]);
        assert_eq!(log.delta_by_start_version(1).unwrap().unwrap(), records[1]);
        assert_eq!(log.delta_by_end_version(3).unwrap().unwrap(), records[1]);
        assert!(log.delta_by_start_version(2).unwrap().is_none());
        assert!(log.delta_by_end_version(2).unwrap().is_none());
    }

    #[test]
    fn adjacent_deltas_share_a_boundary_version() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[2, 3]);
        let first = log.delta_by_end_version(2).unwrap().unwrap();
        let second = log.delta_by_start_version(2).unwrap().unwrap();
        assert_eq!(first.resulting_version(), second.start_version());
    }

    #[test]
    fn arbitrary_version_prefers_the_ending_delta() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        // Spans [0,1), [1,2), [2,5).
        let records = append_chain(&log, &[1, 1, 3]);
        // Version 2 is both an end and a start boundary; the ending delta
        // wins.
        let hit = log.delta_by_arbitrary_version(2).unwrap().unwrap();
        assert_eq!(hit, records[1]);
        // A mid-span version resolves to the containing delta.
        let hit = log.delta_by_arbitrary_version(3).unwrap().unwrap();
        assert_eq!(hit, records[2]);
        // Past the head there is nothing.
        assert!(log.delta_by_arbitrary_version(5).unwrap().is_none());
    }

    #[test]
    fn append_rejects_a_version_gap() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[1]);
        let detached = DeltaRecord::new(HashedVersion::unsigned(5), ops(1), 0).unwrap();
        assert!(matches!(
            log.append(detached).unwrap_err(),
            DeltaError::VersionGap { .. }
        ));
        // The failed append left the log untouched.
        assert_eq!(log.last_modified_version().version(), 1);
    }

    #[test]
    fn append_rejects_a_broken_hash_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[1]);
        // Right version number, hash from a different history.
        let forged = HashedVersion::unsigned(1);
        let record = DeltaRecord::new(forged, ops(1), 0).unwrap();
        assert!(matches!(
            log.append(record).unwrap_err(),
            DeltaError::HashMismatch { .. }
        ));
    }

    #[test]
    fn streaming_visits_all_deltas_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        let records = append_chain(&log, &[1, 2, 1]);
        let mut seen = Vec::new();
        log.for_each_delta_from(0, &mut |record| {
            seen.push(record.clone());
            Ok(true)
        })
        .unwrap();
        assert_eq!(seen, records);
    }

    #[test]
    fn streaming_from_a_boundary_skips_earlier_deltas() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        let records = append_chain(&log, &[1, 2, 1]);
        let mut seen = Vec::new();
        log.for_each_delta_from(3, &mut |record| {
            seen.push(record.clone());
            Ok(true)
        })
        .unwrap();
        assert_eq!(seen, records[2..]);
    }

    #[test]
    fn streaming_stops_immediately_on_false() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[1, 1, 1, 1]);
        let mut calls = 0;
        log.for_each_delta_from(0, &mut |_| {
            calls += 1;
            Ok(calls < 2)
        })
        .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn receiver_errors_propagate() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[1, 1]);
        let mut calls = 0;
        let err = log
            .for_each_delta_from(0, &mut |_| {
                calls += 1;
                Err(DeltaError::Receiver("consumer gave up".into()))
            })
            .unwrap_err();
        assert!(matches!(err, DeltaError::Receiver(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn reopen_restores_the_head() {
        let tmp = tempfile::tempdir().unwrap();
        let last;
        {
            let log = open_log(tmp.path());
            let records = append_chain(&log, &[1, 2]);
            last = *records[1].resulting_version();
        }
        let log = reopen_log(tmp.path());
        assert_eq!(log.last_modified_version(), last);
        assert_eq!(log.last_modified_time_ms(), 1_001);
        // And the chain still extends.
        let record = DeltaRecord::new(last, ops(1), 2_000).unwrap();
        log.append(record).unwrap();
        assert_eq!(log.last_modified_version().version(), 4);
    }

    #[test]
    fn validate_history_accepts_a_clean_log() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        append_chain(&log, &[1, 3, 2]);
        let head = log.validate_history().unwrap();
        assert_eq!(head, log.last_modified_version());
    }

    #[test]
    fn validate_history_of_an_empty_log_is_genesis() {
        let tmp = tempfile::tempdir().unwrap();
        let log = open_log(tmp.path());
        assert_eq!(log.validate_history().unwrap(), HashedVersion::unsigned(0));
    }
}
