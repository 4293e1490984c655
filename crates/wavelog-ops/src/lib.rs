//! Invertible core operation model for WaveLog.
//!
//! Deltas carry [`WaveletOperation`]s; each operation applies to a
//! [`WaveletState`] in place and exposes a structural inverse, enabling
//! undo/redo and deterministic replay. The variant set is closed: new
//! operation kinds extend the enum and the `apply`/`inverse` matches.

pub mod error;
pub mod operation;
pub mod state;

pub use error::OperationError;
pub use operation::WaveletOperation;
pub use state::{SegmentState, WaveletState};
