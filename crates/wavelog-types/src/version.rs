use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Domain separation prefix for the delta hash chain.
const CHAIN_DOMAIN: &[u8] = b"wavelog-delta-v1:";

/// A (version number, content hash) pair forming a tamper-evident chain.
///
/// Each delta's resulting hashed version is computed from the prior hashed
/// version and the delta's serialized content, so any rewrite of history
/// breaks every hash downstream of it. Never mutated after creation.
///
/// Ordering: `version` first, then `hash` to break ties between divergent
/// histories at the same version number.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashedVersion {
    version: u64,
    hash: [u8; 32],
}

impl HashedVersion {
    /// A version with no hash attestation (all-zeros hash).
    ///
    /// `unsigned(0)` is the genesis version every wavelet history starts
    /// from.
    pub const fn unsigned(version: u64) -> Self {
        Self {
            version,
            hash: [0u8; 32],
        }
    }

    /// Construct from an explicit version number and hash.
    pub const fn new(version: u64, hash: [u8; 32]) -> Self {
        Self { version, hash }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Compute the hashed version resulting from applying a delta with the
    /// given serialized payload and operation count on top of `self`.
    pub fn next(&self, delta_payload: &[u8], op_count: u64) -> Self {
        Self {
            version: self.version + op_count,
            hash: chain_hash(&self.hash, delta_payload),
        }
    }

    /// Hex encoding of the hash.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short hex representation of the hash (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    /// Parse a hash from hex and pair it with a version number.
    pub fn from_hex(version: u64, s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self { version, hash })
    }
}

impl PartialOrd for HashedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashedVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl fmt::Debug for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedVersion({}:{})", self.version, self.short_hex())
    }
}

impl fmt::Display for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, self.short_hex())
    }
}

/// Compute the chain hash for a delta payload applied on top of `prev_hash`.
pub fn chain_hash(prev_hash: &[u8; 32], delta_payload: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CHAIN_DOMAIN);
    hasher.update(prev_hash);
    hasher.update(delta_payload);
    *hasher.finalize().as_bytes()
}
