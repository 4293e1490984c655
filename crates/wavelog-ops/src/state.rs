use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use wavelog_types::{HashedVersion, ParticipantId, SegmentId};

/// Per-segment state tracked by the wavelet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentState {
    /// Whether a modification pass is currently open on this segment.
    pub modifying: bool,
}

/// Materialized state of a wavelet: the target that core operations apply
/// to, and the payload that snapshots persist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletState {
    segments: BTreeMap<SegmentId, SegmentState>,
    participants: BTreeSet<ParticipantId>,
    last_modified_version: HashedVersion,
    last_modified_time_ms: u64,
}

impl WaveletState {
    /// Empty state at the genesis version.
    pub fn new() -> Self {
        Self {
            segments: BTreeMap::new(),
            participants: BTreeSet::new(),
            last_modified_version: HashedVersion::unsigned(0),
            last_modified_time_ms: 0,
        }
    }

    pub fn has_segment(&self, segment: &SegmentId) -> bool {
        self.segments.contains_key(segment)
    }

    pub fn is_modifying(&self, segment: &SegmentId) -> bool {
        self.segments
            .get(segment)
            .map(|s| s.modifying)
            .unwrap_or(false)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Segment ids in their total (lexicographic) order.
    pub fn segment_ids(&self) -> impl Iterator<Item = &SegmentId> {
        self.segments.keys()
    }

    pub fn has_participant(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.iter()
    }

    pub fn last_modified_version(&self) -> HashedVersion {
        self.last_modified_version
    }

    pub fn last_modified_time_ms(&self) -> u64 {
        self.last_modified_time_ms
    }

    /// Record the version and time of the most recently applied delta.
    pub fn set_last_modified(&mut self, version: HashedVersion, time_ms: u64) {
        self.last_modified_version = version;
        self.last_modified_time_ms = time_ms;
    }

    pub(crate) fn insert_segment(&mut self, segment: SegmentId) {
        self.segments.insert(segment, SegmentState::default());
    }

    pub(crate) fn remove_segment(&mut self, segment: &SegmentId) {
        self.segments.remove(segment);
    }

    pub(crate) fn set_modifying(&mut self, segment: &SegmentId, modifying: bool) {
        if let Some(state) = self.segments.get_mut(segment) {
            state.modifying = modifying;
        }
    }

    pub(crate) fn insert_participant(&mut self, participant: ParticipantId) {
        self.participants.insert(participant);
    }

    pub(crate) fn remove_participant(&mut self, participant: &ParticipantId) {
        self.participants.remove(participant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty_at_genesis() {
        let state = WaveletState::new();
        assert_eq!(state.segment_count(), 0);
        assert_eq!(state.participants().count(), 0);
        assert_eq!(state.last_modified_version(), HashedVersion::unsigned(0));
        assert_eq!(state.last_modified_time_ms(), 0);
    }

    #[test]
    fn segment_ids_are_ordered() {
        let mut state = WaveletState::new();
        state.insert_segment(SegmentId::tags());
        state.insert_segment(SegmentId::index());
        state.insert_segment(SegmentId::of_blip_id("b1").unwrap());

        let ids: Vec<String> = state.segment_ids().map(|s| s.to_string()).collect();
        assert_eq!(ids, vec!["b+b1", "index", "tags"]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut state = WaveletState::new();
        state.insert_segment(SegmentId::manifest());
        state.set_modifying(&SegmentId::manifest(), true);
        state.insert_participant(ParticipantId::of("alice@example.com").unwrap());
        state.set_last_modified(HashedVersion::unsigned(0).next(b"d", 1), 12345);

        let json = serde_json::to_string(&state).unwrap();
        let parsed: WaveletState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, parsed);
    }
}
