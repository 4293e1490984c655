use thiserror::Error;

/// Errors produced by type construction and classification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid segment id: {0}")]
    InvalidSegmentId(String),

    #[error("segment {0} is not a blip segment")]
    NotABlipSegment(String),

    #[error("invalid {field}: must not be empty")]
    EmptyComponent { field: &'static str },

    #[error("invalid participant address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
