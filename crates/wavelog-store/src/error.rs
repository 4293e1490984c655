use wavelog_types::Status;

/// Errors from the store facade. Converted into [`Status`] before leaving
/// the crate; none of the public methods expose this type directly.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested wavelet does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A directory name under the root does not decode to a wavelet name.
    #[error("invalid wavelet directory name: {0}")]
    InvalidDirName(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid addressing component.
    #[error(transparent)]
    Type(#[from] wavelog_types::TypeError),

    /// Failure from a wavelet's block store.
    #[error(transparent)]
    Block(#[from] wavelog_block::BlockError),
}

/// Result alias for store facade internals.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for Status {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Status::not_found(what),
            StoreError::Block(inner) => inner.into(),
            StoreError::InvalidDirName(_) | StoreError::Type(_) => {
                Status::bad_argument(err.to_string())
            }
            other => Status::persistence_failure("wave store failure").with_cause(other),
        }
    }
}
