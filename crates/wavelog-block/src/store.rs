use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use wavelog_types::Status;

use crate::block::{Block, BlockHeader, BlockId, Fragment};
use crate::config::BlockStoreConfig;
use crate::error::{BlockError, BlockResult};
use crate::fetch::{Fetch, ReadExecutor};
use crate::index::BlockIndex;

const BLOCK_MAGIC: &[u8; 4] = b"WBLK";
const BLOCK_FORMAT_VERSION: u32 = 1;
const BLOCK_HEADER_LEN: u64 = 16;
const BLOCK_FILE_EXT: &str = "blk";
const INDEX_FILE: &str = "index.widx";

/// Append-only block store for one wavelet.
///
/// Fragments are framed, compressed, and appended to size-bounded block
/// files. Once a block reaches the configured low-water threshold it never
/// receives another fragment; the next append rolls into a fresh block.
/// The in-memory index is swapped atomically after both the block bytes
/// and the durable index copy have hit disk, so readers never observe an
/// index entry for bytes that are not durable.
pub struct BlockStore {
    dir: PathBuf,
    config: BlockStoreConfig,
    index: RwLock<Arc<BlockIndex>>,
    /// Serializes appends; never held while waiting on a fetch.
    writer: Mutex<()>,
    /// Single-flight table for block reads: at most one load per block id
    /// is in flight, and every concurrent caller shares its fetch.
    inflight: Mutex<HashMap<BlockId, Fetch<Arc<Block>>>>,
    /// Single-flight slot for durable index reads.
    index_inflight: Mutex<Option<Fetch<Arc<BlockIndex>>>>,
    executor: ReadExecutor,
}

impl BlockStore {
    /// Create a new, empty store at `dir`. The directory is created if
    /// absent and an empty durable index is written immediately.
    pub fn create(dir: impl Into<PathBuf>, config: BlockStoreConfig) -> BlockResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let index = BlockIndex::new();
        persist_index(&dir, &index)?;
        debug!(dir = %dir.display(), "created block store");
        Ok(Self::with_index(dir, config, index))
    }

    /// Open an existing store. Fails with `NotFound` if the directory does
    /// not exist. A missing or corrupt durable index is rebuilt by scanning
    /// the block files.
    pub fn open(dir: impl Into<PathBuf>, config: BlockStoreConfig) -> BlockResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(BlockError::NotFound(format!(
                "block store at {}",
                dir.display()
            )));
        }
        let index = match load_index(&dir) {
            Ok(index) => index,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "rebuilding block index from block files");
                let blocks = scan_blocks(&dir)?;
                let index = BlockIndex::rebuild(blocks.iter());
                persist_index(&dir, &index)?;
                index
            }
        };
        Ok(Self::with_index(dir, config, index))
    }

    fn with_index(dir: PathBuf, config: BlockStoreConfig, index: BlockIndex) -> Self {
        let executor = ReadExecutor::new(config.reader_threads);
        Self {
            dir,
            config,
            index: RwLock::new(Arc::new(index)),
            writer: Mutex::new(()),
            inflight: Mutex::new(HashMap::new()),
            index_inflight: Mutex::new(None),
            executor,
        }
    }

    /// Remove a store's directory and everything in it.
    pub fn delete(dir: &Path) -> BlockResult<()> {
        if !dir.is_dir() {
            return Err(BlockError::NotFound(format!(
                "block store at {}",
                dir.display()
            )));
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    /// The current in-memory index.
    pub fn index(&self) -> Arc<BlockIndex> {
        Arc::clone(&self.index.read().expect("index lock poisoned"))
    }

    /// Append a fragment, returning the id of the block it landed in.
    ///
    /// Ordering is block bytes first, then the durable index, then the
    /// in-memory index. A failure partway leaves the old index visible and
    /// the orphaned bytes are reconciled by the recovery scan.
    pub fn write_fragment(&self, fragment: Fragment) -> BlockResult<BlockId> {
        let _writer = self.writer.lock().expect("writer lock poisoned");
        let index = self.index();

        let block_id = index
            .writable_block(self.config.low_water_bytes)
            .unwrap_or_else(|| index.next_block_id());

        let frame = encode_frame(&fragment, self.config.compression_level)?;
        let path = block_path(&self.dir, block_id);
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if is_new {
            file.write_all(BLOCK_MAGIC)?;
            file.write_all(&BLOCK_FORMAT_VERSION.to_be_bytes())?;
            file.write_all(&block_id.as_u64().to_be_bytes())?;
        }
        file.write_all(&frame)?;
        file.flush()?;
        file.sync_all()?;
        let size_bytes = file.metadata()?.len();

        let mut next = (*index).clone();
        next.record_fragment(block_id, &fragment, size_bytes, now_ms());
        persist_index(&self.dir, &next)?;

        *self.index.write().expect("index lock poisoned") = Arc::new(next);
        debug!(block = %block_id, kind = %fragment.kind, end_version = fragment.end_version, "appended fragment");
        Ok(block_id)
    }

    /// Drop every snapshot entry from the index, durably and in memory.
    /// Superseded snapshot fragments stay in their blocks as dead weight
    /// until the blocks age out; only the index forgets them.
    pub fn clear_snapshot_index(&self) -> BlockResult<()> {
        let _writer = self.writer.lock().expect("writer lock poisoned");
        let mut next = (*self.index()).clone();
        next.clear_snapshots();
        persist_index(&self.dir, &next)?;
        *self.index.write().expect("index lock poisoned") = Arc::new(next);
        debug!("cleared snapshot index");
        Ok(())
    }

    /// Read a set of blocks asynchronously.
    ///
    /// Concurrent requests for the same block id are coalesced: one load
    /// runs and every caller receives the same shared `Arc<Block>`. The
    /// returned fetch resolves to a map from block id to block, or to the
    /// first failure.
    pub fn read_blocks(self: &Arc<Self>, ids: &[BlockId]) -> Fetch<BTreeMap<BlockId, Arc<Block>>> {
        let mut members: Vec<(BlockId, Fetch<Arc<Block>>)> = Vec::with_capacity(ids.len());
        let mut to_load: Vec<(BlockId, Fetch<Arc<Block>>)> = Vec::new();
        {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            for &id in ids {
                if members.iter().any(|(m, _)| *m == id) {
                    continue;
                }
                let fetch = match inflight.get(&id) {
                    Some(existing) => existing.clone(),
                    None => {
                        let fetch: Fetch<Arc<Block>> = Fetch::pending();
                        inflight.insert(id, fetch.clone());
                        to_load.push((id, fetch.clone()));
                        fetch
                    }
                };
                members.push((id, fetch));
            }
        }

        let aggregate: Fetch<BTreeMap<BlockId, Arc<Block>>> = Fetch::pending();
        if members.is_empty() {
            aggregate.complete(Ok(BTreeMap::new()));
            return aggregate;
        }

        // Assemble the result as the member fetches complete; the last one
        // to land (or the first failure) resolves the aggregate.
        let remaining = Arc::new(AtomicUsize::new(members.len()));
        let collected = Arc::new(Mutex::new(BTreeMap::new()));
        for (id, fetch) in &members {
            let id = *id;
            let done = aggregate.clone();
            let remaining = Arc::clone(&remaining);
            let collected = Arc::clone(&collected);
            fetch.on_complete(Box::new(move |result| {
                match result {
                    Ok(block) => {
                        collected
                            .lock()
                            .expect("collected lock poisoned")
                            .insert(id, Arc::clone(block));
                    }
                    Err(status) => done.complete(Err(status.clone())),
                }
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let map =
                        std::mem::take(&mut *collected.lock().expect("collected lock poisoned"));
                    done.complete(Ok(map));
                }
            }));
        }

        // Loads are scheduled after the table lock is released; with zero
        // reader threads they run to completion right here.
        for (id, pending) in to_load {
            let store = Arc::clone(self);
            self.executor.execute(Box::new(move || {
                let result = store.load_block(id).map_err(Status::from);
                let mut inflight = store.inflight.lock().expect("inflight lock poisoned");
                pending.complete(result);
                if inflight.get(&id).is_some_and(|f| f.same_as(&pending)) {
                    inflight.remove(&id);
                }
                drop(inflight);
            }));
        }
        aggregate
    }

    /// Read the durable block index asynchronously. Concurrent requests
    /// share one load.
    pub fn read_block_index(self: &Arc<Self>) -> Fetch<Arc<BlockIndex>> {
        let mut slot = self.index_inflight.lock().expect("inflight lock poisoned");
        if let Some(existing) = slot.as_ref() {
            if !existing.is_complete() {
                return existing.clone();
            }
        }
        let fetch: Fetch<Arc<BlockIndex>> = Fetch::pending();
        *slot = Some(fetch.clone());
        drop(slot);

        let store = Arc::clone(self);
        let pending = fetch.clone();
        self.executor.execute(Box::new(move || {
            let result = load_index(&store.dir)
                .map(Arc::new)
                .map_err(Status::from);
            let mut slot = store.index_inflight.lock().expect("inflight lock poisoned");
            pending.complete(result);
            if slot.as_ref().is_some_and(|f| f.same_as(&pending)) {
                *slot = None;
            }
        }));
        fetch
    }

    /// Load and materialize one block from disk. A corrupt tail frame is
    /// dropped with a warning; everything before it is kept.
    fn load_block(&self, id: BlockId) -> BlockResult<Arc<Block>> {
        let path = block_path(&self.dir, id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlockError::NotFound(format!("{id}")));
            }
            Err(err) => return Err(err.into()),
        };
        let block = parse_block(id, &data)?;
        Ok(Arc::new(block))
    }
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore")
            .field("dir", &self.dir)
            .field("blocks", &self.index().block_count())
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn block_path(dir: &Path, id: BlockId) -> PathBuf {
    dir.join(format!("{id}.{BLOCK_FILE_EXT}"))
}

fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

fn persist_index(dir: &Path, index: &BlockIndex) -> BlockResult<()> {
    let bytes = index.to_bytes()?;
    let tmp = dir.join(format!("{INDEX_FILE}.tmp"));
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, index_path(dir))?;
    Ok(())
}

fn load_index(dir: &Path) -> BlockResult<BlockIndex> {
    let data = fs::read(index_path(dir))?;
    BlockIndex::from_bytes(&data)
}

fn encode_frame(fragment: &Fragment, level: i32) -> BlockResult<Vec<u8>> {
    let raw =
        bincode::serialize(fragment).map_err(|e| BlockError::Serialization(e.to_string()))?;
    let compressed =
        zstd::encode_all(&raw[..], level).map_err(|e| BlockError::Compression(e.to_string()))?;
    let mut frame = Vec::with_capacity(compressed.len() + 8);
    frame.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&compressed).to_le_bytes());
    frame.extend_from_slice(&compressed);
    Ok(frame)
}

/// Parse a block file: validate the header, then decode frames until the
/// end of the file or the first corrupt frame.
fn parse_block(id: BlockId, data: &[u8]) -> BlockResult<Block> {
    if data.len() < BLOCK_HEADER_LEN as usize {
        return Err(BlockError::CorruptFrame {
            offset: 0,
            reason: "file shorter than block header".into(),
        });
    }
    if &data[0..4] != BLOCK_MAGIC {
        return Err(BlockError::InvalidMagic {
            expected: String::from_utf8_lossy(BLOCK_MAGIC).into(),
            actual: String::from_utf8_lossy(&data[0..4]).into(),
        });
    }
    let format = u32::from_be_bytes(data[4..8].try_into().expect("sliced 4 bytes"));
    if format != BLOCK_FORMAT_VERSION {
        return Err(BlockError::UnsupportedVersion(format));
    }
    let stored_id = u64::from_be_bytes(data[8..16].try_into().expect("sliced 8 bytes"));
    if stored_id != id.as_u64() {
        return Err(BlockError::CorruptFrame {
            offset: 8,
            reason: format!("block id mismatch: header says {stored_id}"),
        });
    }

    let mut fragments = Vec::new();
    let mut offset = BLOCK_HEADER_LEN as usize;
    while offset < data.len() {
        match decode_frame(data, offset) {
            Ok((fragment, next)) => {
                fragments.push(fragment);
                offset = next;
            }
            Err(err) => {
                // A torn tail from an interrupted append. Everything before
                // it is intact and the next append overwrites nothing.
                warn!(block = %id, error = %err, "dropping corrupt frame tail");
                break;
            }
        }
    }

    let last_modified_version = fragments.iter().map(|f| f.end_version).max().unwrap_or(0);
    Ok(Block::new(
        BlockHeader {
            block_id: id,
            last_modified_version,
            size_bytes: data.len() as u64,
        },
        fragments,
    ))
}

fn decode_frame(data: &[u8], offset: usize) -> BlockResult<(Fragment, usize)> {
    let corrupt = |reason: &str| BlockError::CorruptFrame {
        offset: offset as u64,
        reason: reason.into(),
    };
    let header = data
        .get(offset..offset + 8)
        .ok_or_else(|| corrupt("truncated frame header"))?;
    let length = u32::from_le_bytes(header[0..4].try_into().expect("sliced 4 bytes")) as usize;
    let expected_crc = u32::from_le_bytes(header[4..8].try_into().expect("sliced 4 bytes"));
    let payload = data
        .get(offset + 8..offset + 8 + length)
        .ok_or_else(|| corrupt("truncated frame payload"))?;
    if crc32fast::hash(payload) != expected_crc {
        return Err(corrupt("CRC mismatch"));
    }
    let raw = zstd::decode_all(payload).map_err(|e| corrupt(&e.to_string()))?;
    let fragment =
        bincode::deserialize(&raw).map_err(|e| BlockError::Serialization(e.to_string()))?;
    Ok((fragment, offset + 8 + length))
}

/// Scan the directory for block files and materialize each one leniently.
fn scan_blocks(dir: &Path) -> BlockResult<Vec<Block>> {
    let mut blocks = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(BLOCK_FILE_EXT) {
            continue;
        }
        let Some(id) = parse_block_file_name(&path) else {
            warn!(path = %path.display(), "skipping unrecognized block file name");
            continue;
        };
        let data = fs::read(&path)?;
        match parse_block(id, &data) {
            Ok(block) => blocks.push(block),
            Err(err) => {
                warn!(block = %id, error = %err, "skipping unreadable block file");
            }
        }
    }
    blocks.sort_by_key(Block::id);
    Ok(blocks)
}

fn parse_block_file_name(path: &Path) -> Option<BlockId> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix("block-")?;
    digits.parse().ok().map(BlockId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn store_in(dir: &Path, config: BlockStoreConfig) -> Arc<BlockStore> {
        Arc::new(BlockStore::create(dir, config).unwrap())
    }

    fn small_config() -> BlockStoreConfig {
        BlockStoreConfig {
            low_water_bytes: 64,
            ..BlockStoreConfig::default()
        }
    }

    #[test]
    fn open_missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err =
            BlockStore::open(tmp.path().join("absent"), BlockStoreConfig::default()).unwrap_err();
        assert!(matches!(err, BlockError::NotFound(_)));
    }

    #[test]
    fn write_then_read_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), BlockStoreConfig::default());
        let id = store
            .write_fragment(Fragment::delta(0, 1, b"first delta".to_vec()))
            .unwrap();
        assert_eq!(id, BlockId(0));

        let blocks = store.read_blocks(&[id]).wait().unwrap();
        let block = &blocks[&id];
        assert_eq!(block.fragment_count(), 1);
        assert_eq!(block.delta_by_end_version(1).unwrap().payload, b"first delta");
    }

    #[test]
    fn read_missing_block_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), BlockStoreConfig::default());
        let status = store.read_blocks(&[BlockId(9)]).wait().unwrap_err();
        assert!(status.is_not_found());
    }

    #[test]
    fn low_water_rotation_allocates_a_fresh_block() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), small_config());
        // Payloads large enough that one frame pushes the file past the
        // 64-byte threshold.
        let first = store
            .write_fragment(Fragment::delta(0, 1, vec![0xA5; 200]))
            .unwrap();
        let second = store
            .write_fragment(Fragment::delta(1, 2, vec![0x5A; 200]))
            .unwrap();
        assert_eq!(first, BlockId(0));
        assert_eq!(second, BlockId(1));
        // The full block never receives another fragment.
        let third = store
            .write_fragment(Fragment::delta(2, 3, vec![0x11; 200]))
            .unwrap();
        assert_eq!(third, BlockId(2));
    }

    #[test]
    fn small_fragments_share_a_block_below_the_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(
            tmp.path(),
            BlockStoreConfig {
                low_water_bytes: 1024 * 1024,
                ..BlockStoreConfig::default()
            },
        );
        let a = store.write_fragment(Fragment::delta(0, 1, vec![1; 16])).unwrap();
        let b = store.write_fragment(Fragment::delta(1, 2, vec![2; 16])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reopen_recovers_index_and_contents() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = store_in(tmp.path(), small_config());
            store
                .write_fragment(Fragment::delta(0, 2, b"one".to_vec()))
                .unwrap();
            store
                .write_fragment(Fragment::delta(2, 3, b"two".to_vec()))
                .unwrap();
        }
        let store = Arc::new(BlockStore::open(tmp.path(), small_config()).unwrap());
        let index = store.index();
        assert_eq!(index.last_modified_version(), 3);
        assert!(index.delta_by_end_version(2).is_some());
    }

    #[test]
    fn missing_index_is_rebuilt_from_block_files() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = store_in(tmp.path(), small_config());
            store
                .write_fragment(Fragment::delta(0, 1, b"kept".to_vec()))
                .unwrap();
        }
        fs::remove_file(index_path(tmp.path())).unwrap();
        let store = Arc::new(BlockStore::open(tmp.path(), small_config()).unwrap());
        let index = store.index();
        assert_eq!(index.last_modified_version(), 1);
        let blocks = store.read_blocks(&[BlockId(0)]).wait().unwrap();
        assert_eq!(blocks[&BlockId(0)].delta_by_end_version(1).unwrap().payload, b"kept");
    }

    #[test]
    fn torn_tail_frame_is_dropped_on_recovery() {
        let tmp = tempfile::tempdir().unwrap();
        let path;
        {
            let store = store_in(tmp.path(), BlockStoreConfig::default());
            store
                .write_fragment(Fragment::delta(0, 1, b"intact".to_vec()))
                .unwrap();
            store
                .write_fragment(Fragment::delta(1, 2, b"torn".to_vec()))
                .unwrap();
            path = block_path(tmp.path(), BlockId(0));
        }
        // Chop bytes off the last frame to simulate an interrupted append.
        let data = fs::read(&path).unwrap();
        fs::write(&path, &data[..data.len() - 3]).unwrap();
        fs::remove_file(index_path(tmp.path())).unwrap();

        let store = Arc::new(BlockStore::open(tmp.path(), BlockStoreConfig::default()).unwrap());
        assert_eq!(store.index().last_modified_version(), 1);
        let blocks = store.read_blocks(&[BlockId(0)]).wait().unwrap();
        let block = &blocks[&BlockId(0)];
        assert_eq!(block.fragment_count(), 1);
        assert_eq!(block.delta_by_end_version(1).unwrap().payload, b"intact");
    }

    #[test]
    fn coalesced_readers_share_the_same_block_instance() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), small_config());
        store
            .write_fragment(Fragment::delta(0, 1, vec![1; 200]))
            .unwrap();

        // Pin an in-flight load so a second request must attach to it.
        let pinned: Fetch<Arc<Block>> = Fetch::pending();
        store
            .inflight
            .lock()
            .unwrap()
            .insert(BlockId(0), pinned.clone());

        let first = store.read_blocks(&[BlockId(0)]);
        let second = store.read_blocks(&[BlockId(0)]);
        assert!(first.try_get().is_none());

        // A write landing in another block does not disturb the in-flight
        // read.
        assert_eq!(
            store
                .write_fragment(Fragment::delta(1, 2, vec![2; 200]))
                .unwrap(),
            BlockId(1)
        );

        let sentinel = Arc::new(Block::new(
            BlockHeader {
                block_id: BlockId(0),
                last_modified_version: 1,
                size_bytes: 0,
            },
            vec![],
        ));
        pinned.complete(Ok(Arc::clone(&sentinel)));

        let a = first.wait().unwrap();
        let b = second.wait().unwrap();
        assert!(Arc::ptr_eq(&a[&BlockId(0)], &sentinel));
        assert!(Arc::ptr_eq(&a[&BlockId(0)], &b[&BlockId(0)]));
    }

    #[test]
    fn inflight_entry_is_cleared_after_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), BlockStoreConfig::default());
        store
            .write_fragment(Fragment::delta(0, 1, b"x".to_vec()))
            .unwrap();
        store.read_blocks(&[BlockId(0)]).wait().unwrap();
        assert!(store.inflight.lock().unwrap().is_empty());
    }

    #[test]
    fn reads_and_writes_interleave_safely() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(
            tmp.path(),
            BlockStoreConfig {
                reader_threads: 2,
                ..small_config()
            },
        );
        store
            .write_fragment(Fragment::delta(0, 1, vec![7; 200]))
            .unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.read_blocks(&[BlockId(0)]).wait())
            })
            .collect();
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.write_fragment(Fragment::delta(1, 2, vec![8; 200])))
        };

        for reader in readers {
            let blocks = reader.join().unwrap().unwrap();
            assert_eq!(
                blocks[&BlockId(0)].delta_by_end_version(1).unwrap().payload,
                vec![7; 200]
            );
        }
        assert_eq!(writer.join().unwrap().unwrap(), BlockId(1));
    }

    #[test]
    fn read_block_index_matches_in_memory_state() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), BlockStoreConfig::default());
        store
            .write_fragment(Fragment::delta(0, 3, b"abc".to_vec()))
            .unwrap();
        let durable = store.read_block_index().wait().unwrap();
        assert_eq!(*durable, *store.index());
    }

    #[test]
    fn delete_removes_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("w");
        {
            let store = store_in(&dir, BlockStoreConfig::default());
            store
                .write_fragment(Fragment::delta(0, 1, b"gone".to_vec()))
                .unwrap();
        }
        BlockStore::delete(&dir).unwrap();
        assert!(!dir.exists());
        assert!(matches!(
            BlockStore::delete(&dir).unwrap_err(),
            BlockError::NotFound(_)
        ));
    }
}
