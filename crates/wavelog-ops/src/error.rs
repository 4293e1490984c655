use thiserror::Error;
use wavelog_types::{ParticipantId, SegmentId};

/// Precondition violations raised when applying an operation to wavelet
/// state. Always a programming or data-consistency error, never silently
/// ignored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("segment already exists: {0}")]
    SegmentExists(SegmentId),

    #[error("segment does not exist: {0}")]
    SegmentMissing(SegmentId),

    #[error("segment is already being modified: {0}")]
    AlreadyModifying(SegmentId),

    #[error("segment is not being modified: {0}")]
    NotModifying(SegmentId),

    #[error("cannot remove segment while it is being modified: {0}")]
    RemoveWhileModifying(SegmentId),

    #[error("participant already present: {0}")]
    ParticipantExists(ParticipantId),

    #[error("participant not present: {0}")]
    ParticipantMissing(ParticipantId),
}
