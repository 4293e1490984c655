use wavelog_types::Status;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// The requested store, block, or fragment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compression or decompression failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// A block or index file does not start with the expected magic.
    #[error("invalid magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    /// A block or index file has an unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    /// A fragment frame failed validation.
    #[error("corrupt frame at offset {offset}: {reason}")]
    CorruptFrame { offset: u64, reason: String },

    /// The durable block index could not be decoded.
    #[error("index corrupted: {0}")]
    IndexCorrupted(String),
}

/// Result alias for block store operations.
pub type BlockResult<T> = Result<T, BlockError>;

impl From<BlockError> for Status {
    fn from(err: BlockError) -> Self {
        match &err {
            BlockError::NotFound(what) => Status::not_found(what.clone()),
            _ => Status::persistence_failure("block store failure").with_cause(err),
        }
    }
}
