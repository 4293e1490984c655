//! Lifecycle facade over persisted wavelets.
//!
//! A [`WaveStore`] owns a root directory and hands out [`WaveletAccess`]
//! handles wiring together one block store, delta log, and snapshot
//! ladder per wavelet. All failures cross this boundary as the uniform
//! [`wavelog_types::Status`] type.

pub mod access;
mod dirs;
pub mod error;
pub mod store;

pub use access::WaveletAccess;
pub use error::{StoreError, StoreResult};
pub use store::{WaveStore, WaveStoreConfig};
