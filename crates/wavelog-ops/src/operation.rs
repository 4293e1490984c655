use serde::{Deserialize, Serialize};
use wavelog_types::{ParticipantId, SegmentId};

use crate::error::OperationError;
use crate::state::WaveletState;

/// One unit of mutation applied to a wavelet.
///
/// A closed variant set: `apply` and `inverse` are total matches over it.
/// Every variant holds exactly the fields needed to construct its inverse,
/// so inversion never re-reads target state. Equality and hashing are
/// structural over the operation's target (operations carry no timing).
///
/// Inverse pairs: `AddSegment` ↔ `RemoveSegment`,
/// `StartModifyingSegment` ↔ `EndModifyingSegment`,
/// `AddParticipant` ↔ `RemoveParticipant`. `NoOp` is its own inverse.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveletOperation {
    /// Create a segment. Fails if the segment already exists.
    AddSegment { segment: SegmentId },
    /// Delete a segment. Fails if the segment is missing or mid-modification.
    RemoveSegment { segment: SegmentId },
    /// Open a modification pass on a segment.
    StartModifyingSegment { segment: SegmentId },
    /// Close the modification pass on a segment.
    EndModifyingSegment { segment: SegmentId },
    /// Add a participant to the wavelet.
    AddParticipant { participant: ParticipantId },
    /// Remove a participant from the wavelet.
    RemoveParticipant { participant: ParticipantId },
    /// A versioned no-op (used for version bumps without state change).
    NoOp,
}

impl WaveletOperation {
    /// Apply this operation to the target state in place.
    ///
    /// Fails with an [`OperationError`] when the target is inconsistent
    /// with the operation's preconditions; on failure the state is
    /// unchanged.
    pub fn apply(&self, state: &mut WaveletState) -> Result<(), OperationError> {
        match self {
            Self::AddSegment { segment } => {
                if state.has_segment(segment) {
                    return Err(OperationError::SegmentExists(segment.clone()));
                }
                state.insert_segment(segment.clone());
                Ok(())
            }
            Self::RemoveSegment { segment } => {
                if !state.has_segment(segment) {
                    return Err(OperationError::SegmentMissing(segment.clone()));
                }
                if state.is_modifying(segment) {
                    return Err(OperationError::RemoveWhileModifying(segment.clone()));
                }
                state.remove_segment(segment);
                Ok(())
            }
            Self::StartModifyingSegment { segment } => {
                if !state.has_segment(segment) {
                    return Err(OperationError::SegmentMissing(segment.clone()));
                }
                if state.is_modifying(segment) {
                    return Err(OperationError::AlreadyModifying(segment.clone()));
                }
                state.set_modifying(segment, true);
                Ok(())
            }
            Self::EndModifyingSegment { segment } => {
                if !state.has_segment(segment) {
                    return Err(OperationError::SegmentMissing(segment.clone()));
                }
                if !state.is_modifying(segment) {
                    return Err(OperationError::NotModifying(segment.clone()));
                }
                state.set_modifying(segment, false);
                Ok(())
            }
            Self::AddParticipant { participant } => {
                if state.has_participant(participant) {
                    return Err(OperationError::ParticipantExists(participant.clone()));
                }
                state.insert_participant(participant.clone());
                Ok(())
            }
            Self::RemoveParticipant { participant } => {
                if !state.has_participant(participant) {
                    return Err(OperationError::ParticipantMissing(participant.clone()));
                }
                state.remove_participant(participant);
                Ok(())
            }
            Self::NoOp => Ok(()),
        }
    }

    /// The structurally-opposite operation, computed purely from this
    /// operation's own fields.
    pub fn inverse(&self) -> Self {
        match self {
            Self::AddSegment { segment } => Self::RemoveSegment {
                segment: segment.clone(),
            },
            Self::RemoveSegment { segment } => Self::AddSegment {
                segment: segment.clone(),
            },
            Self::StartModifyingSegment { segment } => Self::EndModifyingSegment {
                segment: segment.clone(),
            },
            Self::EndModifyingSegment { segment } => Self::StartModifyingSegment {
                segment: segment.clone(),
            },
            Self::AddParticipant { participant } => Self::RemoveParticipant {
                participant: participant.clone(),
            },
            Self::RemoveParticipant { participant } => Self::AddParticipant {
                participant: participant.clone(),
            },
            Self::NoOp => Self::NoOp,
        }
    }

    /// The segment this operation targets, if any.
    pub fn target_segment(&self) -> Option<&SegmentId> {
        match self {
            Self::AddSegment { segment }
            | Self::RemoveSegment { segment }
            | Self::StartModifyingSegment { segment }
            | Self::EndModifyingSegment { segment } => Some(segment),
            _ => None,
        }
    }
}
