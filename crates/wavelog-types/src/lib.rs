//! Foundation types for WaveLog.
//!
//! This crate provides the addressing, versioning, and status types used
//! throughout the WaveLog engine. Every other WaveLog crate depends on
//! `wavelog-types`.
//!
//! # Key Types
//!
//! - [`WaveletName`] — fully-qualified wavelet addressing (wave + wavelet)
//! - [`SegmentId`] / [`SegmentName`] — addressing of logical sub-documents
//! - [`HashedVersion`] — (version, hash) pairs forming a tamper-evident chain
//! - [`ParticipantId`] — validated participant addresses
//! - [`Status`] / [`StatusCode`] — the uniform error boundary of the core

pub mod error;
pub mod name;
pub mod segment;
pub mod status;
pub mod version;

pub use error::TypeError;
pub use name::{ParticipantId, WaveId, WaveletId, WaveletName};
pub use segment::{SegmentId, SegmentName};
pub use status::{Status, StatusCode};
pub use version::{chain_hash, HashedVersion};
