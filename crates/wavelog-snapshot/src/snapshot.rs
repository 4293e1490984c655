use serde::{Deserialize, Serialize};
use wavelog_ops::WaveletState;
use wavelog_types::{HashedVersion, WaveletName};

/// Materialized wavelet state at one checkpoint version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletSnapshot {
    wavelet: WaveletName,
    version: HashedVersion,
    created_at_ms: u64,
    state: WaveletState,
}

impl WaveletSnapshot {
    /// The empty state at version 0.
    pub fn initial(wavelet: WaveletName, created_at_ms: u64) -> Self {
        Self {
            wavelet,
            version: HashedVersion::unsigned(0),
            created_at_ms,
            state: WaveletState::new(),
        }
    }

    /// A snapshot of `state` at `version`.
    pub fn at(
        wavelet: WaveletName,
        version: HashedVersion,
        created_at_ms: u64,
        state: WaveletState,
    ) -> Self {
        Self {
            wavelet,
            version,
            created_at_ms,
            state,
        }
    }

    pub fn wavelet(&self) -> &WaveletName {
        &self.wavelet
    }

    pub fn version(&self) -> &HashedVersion {
        &self.version
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn state(&self) -> &WaveletState {
        &self.state
    }

    pub fn is_initial(&self) -> bool {
        self.version.version() == 0
    }

    /// Consume the snapshot, yielding its state for replay.
    pub fn into_state(self) -> WaveletState {
        self.state
    }
}
