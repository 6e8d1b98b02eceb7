//! # Header Chain Validation
//!
//! A submitted segment must be a contiguous run of headers.
//!
//! # Checks (every adjacent pair)
//! 1. Parent hash continuity
//! 2. Height increment
//! 3. Timestamp does not decrease

use super::errors::ChainError;
use shared_types::HeaderEntry;

/// Largest accepted segment.
pub const MAX_HEADERS: usize = 256;

/// Validate a header segment of `1..=MAX_HEADERS` entries.
pub fn validate(headers: &[HeaderEntry]) -> Result<(), ChainError> {
    if headers.is_empty() || headers.len() > MAX_HEADERS {
        return Err(ChainError::InvalidCount {
            count: headers.len(),
        });
    }

    for window in headers.windows(2) {
        let prev = &window[0];
        let curr = &window[1];

        if curr.prev_hash != prev.hash {
            return Err(ChainError::BrokenLink {
                height: curr.height,
            });
        }

        match prev.height.checked_add(1) {
            Some(expected) if curr.height == expected => {}
            expected => {
                return Err(ChainError::HeightGap {
                    expected: expected.unwrap_or(u64::MAX),
                    got: curr.height,
                });
            }
        }

        if curr.timestamp < prev.timestamp {
            return Err(ChainError::TimestampRegression {
                height: curr.height,
            });
        }
    }

    Ok(())
}
