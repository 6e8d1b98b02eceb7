//! Publish-token authentication.

use axum::http::{header, HeaderMap};

/// Constant-time string comparison to prevent timing attacks.
///
/// Lengths are compared in constant time as well: both inputs are padded to
/// the longer length with different fill bytes.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// `Authorization` carries the publish token, either as `Bearer <token>` or
/// bare.
pub fn bearer_matches(headers: &HeaderMap, token: &str) -> bool {
    let got = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();
    let bearer = format!("Bearer {token}");

    // Both comparisons always run.
    let as_bearer = constant_time_compare(got, &bearer);
    let as_raw = constant_time_compare(got, token);
    as_bearer | as_raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret", "secret"));
        assert!(!constant_time_compare("secret", "secreT"));
        assert!(!constant_time_compare("secret", "secret1"));
        assert!(!constant_time_compare("", "x"));
        assert!(constant_time_compare("", ""));
    }

    fn auth(value: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, value.parse().unwrap());
        h
    }

    #[test]
    fn test_bearer_forms() {
        assert!(bearer_matches(&auth("Bearer tok-1"), "tok-1"));
        assert!(bearer_matches(&auth("  Bearer tok-1 "), "tok-1"));
        assert!(bearer_matches(&auth("tok-1"), "tok-1"));
        assert!(!bearer_matches(&auth("Bearer tok-2"), "tok-1"));
        assert!(!bearer_matches(&auth("bearer tok-1"), "tok-1"));
        assert!(!bearer_matches(&HeaderMap::new(), "tok-1"));
    }
}
