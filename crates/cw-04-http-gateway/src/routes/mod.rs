//! HTTP handlers.
//!
//! Ingest handlers run every admission check before touching state; read
//! handlers only clamp their query and shape the stored records.

pub mod announce;
pub mod bootstrap;
pub mod headers;
pub mod reads;
pub mod stats;
pub mod system;

use crate::domain::error::ApiResult;
use serde::Deserialize;

/// Metric label for an ingest result.
pub(crate) fn outcome<T>(result: &ApiResult<T>) -> &str {
    match result {
        Ok(_) => "accepted",
        Err(e) => e.code(),
    }
}

/// `?limit=N`; kept as text so a malformed value falls back to the default
/// instead of rejecting the read.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    /// Parsed limit clamped to `1..=max`.
    pub fn clamped(&self, default: usize, max: usize) -> usize {
        let requested = self
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map_or(default as i64, |n| n);
        requested.clamp(1, max.max(1) as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(limit: Option<&str>) -> LimitQuery {
        LimitQuery {
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(q(None).clamped(50, 200), 50);
        assert_eq!(q(Some("10")).clamped(50, 200), 10);
        assert_eq!(q(Some("0")).clamped(50, 200), 1);
        assert_eq!(q(Some("-4")).clamped(50, 200), 1);
        assert_eq!(q(Some("9999")).clamped(50, 200), 200);
        assert_eq!(q(Some("lots")).clamped(20, 100), 20);
    }
}
