//! # Error Types
//!
//! Invariant violations detectable on the shared entities themselves.

use thiserror::Error;

/// A persisted record failed one of its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Peer port outside `1..=65535`.
    #[error("invalid port: {0}")]
    InvalidPort(u16),

    /// A field that identifies the record is empty.
    #[error("empty field: {0}")]
    EmptyField(&'static str),

    /// A header snapshot carries no headers.
    #[error("snapshot at height {height} has no headers")]
    EmptyHeaders { height: u64 },
}
