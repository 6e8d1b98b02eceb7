//! # Domain Errors

use shared_store::StoreError;
use shared_types::EntityError;
use thiserror::Error;

/// A submitted header segment is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Segment is empty or longer than the accepted maximum.
    #[error("invalid header count: {count}")]
    InvalidCount {
        /// Number of headers submitted
        count: usize,
    },

    /// `prev_hash` does not link to the previous header.
    #[error("broken link at height {height}")]
    BrokenLink {
        /// Height of the header with the bad parent link
        height: u64,
    },

    /// Heights are not consecutive.
    #[error("height gap: expected {expected}, got {got}")]
    HeightGap {
        /// Height implied by the previous header
        expected: u64,
        /// Height found
        got: u64,
    },

    /// Timestamp went backwards.
    #[error("timestamp regression at height {height}")]
    TimestampRegression {
        /// Height of the header whose timestamp regressed
        height: u64,
    },
}

/// Quorum engine errors.
#[derive(Debug, Error)]
pub enum QuorumError {
    #[error("invalid header chain: {0}")]
    Chain(#[from] ChainError),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] EntityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
