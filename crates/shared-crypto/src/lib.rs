//! # Shared Crypto - Payload Signing Primitives
//!
//! Everything a node and the gateway must agree on byte-for-byte before a
//! signature can be checked.
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `canonical` | Ordered-struct payload → compact JSON bytes |
//! | `encoding` | Hex / `0x`-hex / base64 / base64url key and signature text |
//! | `signatures` | Ed25519 keys, signatures and fail-closed verification |
//! | `trust` | Operator-configured public key allow-lists |
//!
//! ## Security Properties
//!
//! - **Fail closed**: [`verify_detached`] returns `false` on every decoding,
//!   length or point error and never panics.
//! - **Strict verification**: small-order keys and malleable signatures are
//!   rejected (`verify_strict`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod encoding;
pub mod errors;
pub mod signatures;
pub mod trust;

// Re-exports
pub use canonical::{canonical_f64, canonical_opt_f64, canonicalize};
pub use encoding::{decode_key_material, encode_hex};
pub use errors::CryptoError;
pub use signatures::{verify_detached, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use trust::TrustedKeys;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
