//! Storage error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The key holds a value of another kind (e.g. `incr` on a set).
    #[error("wrong value type at key {key}")]
    WrongType { key: String },

    #[error("failed to encode value for {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to decode value at {key}: {reason}")]
    Decode { key: String, reason: String },
}
