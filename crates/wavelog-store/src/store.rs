use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use wavelog_block::BlockStoreConfig;
use wavelog_types::{Status, WaveId, WaveletId, WaveletName};

use crate::access::WaveletAccess;
use crate::dirs::{escape, unescape};
use crate::error::StoreError;

/// Configuration for a wave store.
#[derive(Clone, Debug)]
pub struct WaveStoreConfig {
    /// Per-wavelet block store settings.
    pub block: BlockStoreConfig,
    /// Applied operations between checkpoints when remaking snapshot
    /// history.
    pub snapshot_period_ops: usize,
}

impl Default for WaveStoreConfig {
    fn default() -> Self {
        Self {
            block: BlockStoreConfig::default(),
            snapshot_period_ops: 1_000,
        }
    }
}

/// Root-directory facade over all persisted wavelets.
///
/// Each wavelet lives under `root/<wave id>/<wavelet id>` with both path
/// components percent-escaped. Opening a wavelet is idempotent: repeated
/// opens share one [`WaveletAccess`] (and therefore one block store, so
/// in-flight read coalescing spans all users of the wavelet).
pub struct WaveStore {
    root: PathBuf,
    config: WaveStoreConfig,
    open_wavelets: Mutex<HashMap<WaveletName, Arc<WaveletAccess>>>,
}

impl WaveStore {
    pub fn new(root: impl Into<PathBuf>, config: WaveStoreConfig) -> Result<Self, Status> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Status::from(StoreError::Io(e)))?;
        debug!(root = %root.display(), "opened wave store");
        Ok(Self {
            root,
            config,
            open_wavelets: Mutex::new(HashMap::new()),
        })
    }

    fn wave_dir(&self, wave_id: &WaveId) -> PathBuf {
        self.root.join(escape(&wave_id.to_string()))
    }

    fn wavelet_dir(&self, name: &WaveletName) -> PathBuf {
        self.wave_dir(name.wave_id())
            .join(escape(&name.wavelet_id().to_string()))
    }

    /// Open a wavelet, creating its backing storage on first use.
    pub fn open(&self, name: &WaveletName) -> Result<Arc<WaveletAccess>, Status> {
        let mut open = self.open_wavelets.lock().expect("open table poisoned");
        if let Some(access) = open.get(name) {
            return Ok(Arc::clone(access));
        }
        let access = Arc::new(WaveletAccess::open(
            name.clone(),
            &self.wavelet_dir(name),
            self.config.block.clone(),
            self.config.snapshot_period_ops,
        )?);
        open.insert(name.clone(), Arc::clone(&access));
        Ok(access)
    }

    /// Delete a wavelet's storage. Fails with not-found if the wavelet
    /// never existed.
    pub fn delete(&self, name: &WaveletName) -> Result<(), Status> {
        self.open_wavelets
            .lock()
            .expect("open table poisoned")
            .remove(name);
        let dir = self.wavelet_dir(name);
        if !dir.is_dir() {
            return Err(Status::not_found(format!("wavelet {name}")));
        }
        fs::remove_dir_all(&dir).map_err(|e| Status::from(StoreError::Io(e)))?;
        // The wave directory stays around only while it has wavelets.
        let _ = fs::remove_dir(self.wave_dir(name.wave_id()));
        debug!(wavelet = %name, "deleted wavelet");
        Ok(())
    }

    /// Enumerate the known wavelets of a wave, in name order. A wave with
    /// no persisted wavelets yields an empty list.
    pub fn lookup(&self, wave_id: &WaveId) -> Result<Vec<WaveletName>, Status> {
        let wave_dir = self.wave_dir(wave_id);
        if !wave_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let entries = fs::read_dir(&wave_dir).map_err(|e| Status::from(StoreError::Io(e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| Status::from(StoreError::Io(e)))?;
            if !entry.path().is_dir() {
                continue;
            }
            let dir_name = entry.file_name();
            let Some(dir_name) = dir_name.to_str() else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 directory");
                continue;
            };
            match decode_wavelet_id(dir_name) {
                Ok(wavelet_id) => {
                    names.push(WaveletName::new(wave_id.clone(), wavelet_id));
                }
                Err(err) => {
                    warn!(dir = dir_name, error = %err, "skipping unrecognized wavelet directory");
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Release every cached wavelet handle. Outstanding `Arc`s stay valid;
    /// later opens re-read from disk.
    pub fn close(&self) {
        self.open_wavelets
            .lock()
            .expect("open table poisoned")
            .clear();
        debug!(root = %self.root.display(), "closed wave store");
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn decode_wavelet_id(dir_name: &str) -> Result<WaveletId, StoreError> {
    let raw = unescape(dir_name)?;
    let (domain, id) = raw
        .split_once('/')
        .ok_or_else(|| StoreError::InvalidDirName(dir_name.into()))?;
    Ok(WaveletId::new(domain, id)?)
}
