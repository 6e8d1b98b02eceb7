//! # Key and Signature Text Encodings
//!
//! Nodes ship keys and signatures as text. Accepted forms:
//! - hex, optionally prefixed with `0x`
//! - base64 or base64url, padding optional

use crate::CryptoError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decode hex / `0x`-hex / base64 / base64url text to raw bytes.
///
/// Text that is entirely hex digits (after stripping `0x`) with an even
/// length is decoded as hex; everything else is tried as base64.
pub fn decode_key_material(input: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidEncoding("empty".into()));
    }

    let unprefixed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if !unprefixed.is_empty()
        && unprefixed.len() % 2 == 0
        && unprefixed.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return hex::decode(unprefixed).map_err(|e| CryptoError::InvalidEncoding(e.to_string()));
    }

    let mut normalized: String = trimmed
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
}

/// Decode into a fixed-size array, checking the length.
pub fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], CryptoError> {
    let bytes = decode_key_material(input)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidLength {
            expected: N,
            actual,
        })
}

/// Lowercase hex, the form the gateway emits.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
