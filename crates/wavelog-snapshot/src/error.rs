use wavelog_types::Status;

/// Errors from snapshot store operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The requested snapshot does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A snapshot offered as initial does not sit at version 0.
    #[error("snapshot at version {0} is not an initial snapshot")]
    NotInitial(u64),

    /// The checkpoint period must be at least one operation.
    #[error("invalid snapshot period: {0}")]
    InvalidPeriod(usize),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Replaying the delta log failed to apply an operation.
    #[error("replay failed: {0}")]
    Replay(#[from] wavelog_ops::OperationError),

    /// Failure from the delta log during a rebuild or replay.
    #[error(transparent)]
    Delta(#[from] wavelog_delta::DeltaError),

    /// Failure from the underlying block store.
    #[error(transparent)]
    Storage(#[from] wavelog_block::BlockError),

    /// Failure surfaced by an asynchronous block fetch.
    #[error("block fetch failed: {0}")]
    Fetch(#[from] Status),

    /// A snapshot-plus-tail replay disagrees with full replay.
    #[error("snapshot at version {version} diverges from replayed history")]
    Divergence { version: u64 },
}

/// Result alias for snapshot store operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl From<SnapshotError> for Status {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::NotFound(what) => Status::not_found(what),
            SnapshotError::Storage(inner) => inner.into(),
            SnapshotError::Delta(inner) => inner.into(),
            SnapshotError::Fetch(status) => status,
            SnapshotError::NotInitial(_) | SnapshotError::InvalidPeriod(_) => {
                Status::bad_argument(err.to_string())
            }
            SnapshotError::Replay(inner) => {
                Status::operation_failed("replay failed").with_cause(inner)
            }
            other => Status::persistence_failure("snapshot store failure").with_cause(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelog_types::StatusCode;

    #[test]
    fn not_found_maps_to_not_found() {
        let status: Status = SnapshotError::NotFound("initial snapshot".into()).into();
        assert_eq!(status.code(), StatusCode::NotFound);
    }

    #[test]
    fn invalid_period_maps_to_bad_argument() {
        let status: Status = SnapshotError::InvalidPeriod(0).into();
        assert_eq!(status.code(), StatusCode::BadArgument);
    }

    #[test]
    fn divergence_maps_to_persistence_failure() {
        let status: Status = SnapshotError::Divergence { version: 8 }.into();
        assert_eq!(status.code(), StatusCode::PersistenceFailure);
    }
}
