//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Text is neither hex nor base64
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded key or signature has the wrong size
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Bytes do not describe a curve point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Payload could not be canonicalized
    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),
}
