use wavelog_types::Status;

/// Errors from delta log operations.
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    /// A delta must carry at least one operation.
    #[error("delta carries no operations")]
    EmptyDelta,

    /// An appended delta does not start where the log ends.
    #[error("version gap: log ends at {expected}, delta starts at {actual}")]
    VersionGap { expected: u64, actual: u64 },

    /// An appended or replayed delta breaks the hash chain.
    #[error("hash chain mismatch at version {version}")]
    HashMismatch { version: u64 },

    /// A record's declared resulting version disagrees with its contents.
    #[error("invalid delta record: {0}")]
    InvalidRecord(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failure from the underlying block store.
    #[error(transparent)]
    Storage(#[from] wavelog_block::BlockError),

    /// Failure surfaced by an asynchronous block fetch.
    #[error("block fetch failed: {0}")]
    Fetch(#[from] Status),

    /// Failure raised by a streaming receiver.
    #[error("receiver failed: {0}")]
    Receiver(String),
}

/// Result alias for delta log operations.
pub type DeltaResult<T> = Result<T, DeltaError>;

impl From<DeltaError> for Status {
    fn from(err: DeltaError) -> Self {
        match err {
            DeltaError::Storage(inner) => inner.into(),
            DeltaError::Fetch(status) => status,
            DeltaError::EmptyDelta | DeltaError::VersionGap { .. } => {
                Status::bad_argument(err.to_string())
            }
            other => Status::persistence_failure("delta log failure").with_cause(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelog_types::StatusCode;

    #[test]
    fn version_gap_maps_to_bad_argument() {
        let status: Status = DeltaError::VersionGap {
            expected: 3,
            actual: 5,
        }
        .into();
        assert_eq!(status.code(), StatusCode::BadArgument);
    }

    #[test]
    fn storage_not_found_stays_not_found() {
        let err = DeltaError::Storage(wavelog_block::BlockError::NotFound("block-000001".into()));
        let status: Status = err.into();
        assert_eq!(status.code(), StatusCode::NotFound);
    }

    #[test]
    fn chain_mismatch_maps_to_persistence_failure() {
        let status: Status = DeltaError::HashMismatch { version: 4 }.into();
        assert_eq!(status.code(), StatusCode::PersistenceFailure);
    }
}
