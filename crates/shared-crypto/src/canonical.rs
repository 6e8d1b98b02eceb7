//! # Canonical Payload Encoding
//!
//! Signers and verifiers hash the same bytes only if they serialize the same
//! way. A signed payload is a struct whose fields are declared in signing
//! order; serde emits them in declaration order as compact JSON.
//!
//! Rules:
//! - no whitespace, JSON string escaping
//! - absent optionals are omitted (`skip_serializing_if = "Option::is_none"`),
//!   never written as `null`
//! - integral floats are written as integers (`2` not `2.0`) via
//!   [`canonical_f64`] / [`canonical_opt_f64`]

use crate::CryptoError;
use serde::{Serialize, Serializer};

/// Largest integer an IEEE double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Serialize `value` to canonical bytes.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    serde_json::to_vec(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}

/// `serialize_with` helper writing integral floats without a fractional part.
pub fn canonical_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let v = *value;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(v as i64)
    } else {
        serializer.serialize_f64(v)
    }
}

/// Optional variant of [`canonical_f64`]; pair it with
/// `skip_serializing_if = "Option::is_none"`.
pub fn canonical_opt_f64<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => canonical_f64(v, serializer),
        None => serializer.serialize_none(),
    }
}
