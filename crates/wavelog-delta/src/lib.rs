//! Append-only delta log for wavelet histories.
//!
//! Each wavelet's history is a gapless, hash-chained sequence of
//! [`DeltaRecord`]s persisted through the block store. The log resolves
//! deltas by start version, end version, or any version inside a delta's
//! span, and streams history to a cooperative, cancelable receiver.

pub mod error;
pub mod log;
pub mod record;
pub mod traits;

pub use error::{DeltaError, DeltaResult};
pub use log::FileDeltaLog;
pub use record::DeltaRecord;
pub use traits::{DeltaLogReader, DeltaLogWriter, DeltaReceiver};
