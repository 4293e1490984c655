use serde::{Deserialize, Serialize};
use wavelog_ops::WaveletOperation;
use wavelog_types::HashedVersion;

use crate::error::{DeltaError, DeltaResult};

/// One applied delta: the version it starts from, the hashed version it
/// produces, when it was applied, and the operations it carries.
///
/// Records in a log are totally ordered with no gaps: the resulting
/// version of record *n* is the start version of record *n+1*, and the
/// hash of each resulting version chains over the previous hash and the
/// serialized operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRecord {
    start_version: HashedVersion,
    resulting_version: HashedVersion,
    applied_at_ms: u64,
    ops: Vec<WaveletOperation>,
}

impl DeltaRecord {
    /// Build a record on top of `start_version`, deriving the resulting
    /// hashed version from the serialized operations. Rejects empty deltas.
    pub fn new(
        start_version: HashedVersion,
        ops: Vec<WaveletOperation>,
        applied_at_ms: u64,
    ) -> DeltaResult<Self> {
        if ops.is_empty() {
            return Err(DeltaError::EmptyDelta);
        }
        let payload = ops_payload(&ops)?;
        let resulting_version = start_version.next(&payload, ops.len() as u64);
        Ok(Self {
            start_version,
            resulting_version,
            applied_at_ms,
            ops,
        })
    }

    pub fn start_version(&self) -> &HashedVersion {
        &self.start_version
    }

    pub fn resulting_version(&self) -> &HashedVersion {
        &self.resulting_version
    }

    pub fn applied_at_ms(&self) -> u64 {
        self.applied_at_ms
    }

    pub fn ops(&self) -> &[WaveletOperation] {
        &self.ops
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Whether the record's `[start, end)` span contains `version`.
    pub fn contains_version(&self, version: u64) -> bool {
        self.start_version.version() <= version && version < self.resulting_version.version()
    }

    /// Verify this record links onto `prev`: same start version and hash,
    /// and a resulting version that matches a recomputation of the chain.
    pub fn verify_link(&self, prev: &HashedVersion) -> DeltaResult<()> {
        if self.ops.is_empty() {
            return Err(DeltaError::EmptyDelta);
        }
        if self.start_version.version() != prev.version() {
            return Err(DeltaError::VersionGap {
                expected: prev.version(),
                actual: self.start_version.version(),
            });
        }
        if self.start_version.hash() != prev.hash() {
            return Err(DeltaError::HashMismatch {
                version: self.start_version.version(),
            });
        }
        let payload = ops_payload(&self.ops)?;
        let expected = prev.next(&payload, self.ops.len() as u64);
        if expected != self.resulting_version {
            return Err(DeltaError::InvalidRecord(format!(
                "resulting version {} does not match recomputed chain value",
                self.resulting_version.version()
            )));
        }
        Ok(())
    }
}

/// Canonical byte encoding of a delta's operations, the input to the
/// version hash chain.
pub(crate) fn ops_payload(ops: &[WaveletOperation]) -> DeltaResult<Vec<u8>> {
    bincode::serialize(ops).map_err(|e| DeltaError::Serialization(e.to_string()))
}
