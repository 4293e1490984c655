use wavelog_types::HashedVersion;

use crate::error::DeltaResult;
use crate::record::DeltaRecord;

/// Push-based, cancelable receiver for streamed deltas. Returning
/// `Ok(true)` continues iteration, `Ok(false)` stops it immediately, and
/// an error aborts the stream and propagates to the caller.
pub type DeltaReceiver<'a> = dyn FnMut(&DeltaRecord) -> DeltaResult<bool> + 'a;

/// Read access to one wavelet's delta log.
pub trait DeltaLogReader: Send + Sync {
    /// `true` iff no delta has ever been appended.
    fn is_empty(&self) -> bool;

    /// The resulting version of the most recent delta, or the version-0
    /// sentinel when the log is empty.
    fn last_modified_version(&self) -> HashedVersion;

    /// The application time of the most recent delta, or `0` when empty.
    fn last_modified_time_ms(&self) -> u64;

    /// The delta starting exactly at `version`, if any.
    fn delta_by_start_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>>;

    /// The delta ending exactly at `version`, if any.
    fn delta_by_end_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>>;

    /// The delta passing by or leading to `version`: the delta ending
    /// exactly at `version` when one exists, else the delta whose
    /// `[start, end)` span contains it.
    fn delta_by_arbitrary_version(&self, version: u64) -> DeltaResult<Option<DeltaRecord>>;

    /// Stream every delta whose resulting version is greater than
    /// `version`, in version order, to `receiver`.
    fn for_each_delta_from(&self, version: u64, receiver: &mut DeltaReceiver<'_>)
        -> DeltaResult<()>;
}

/// Write access to one wavelet's delta log. Append is the only mutation.
pub trait DeltaLogWriter: Send + Sync {
    /// Append a delta that chains onto the current log head, returning the
    /// new head version. The append is atomic: on failure the log is
    /// unchanged and no reader ever observes a partial entry.
    fn append(&self, delta: DeltaRecord) -> DeltaResult<HashedVersion>;
}
