use serde::Serialize;
use shared_types::Fingerprint;

/// Result of one snapshot submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuorumOutcome {
    /// Distinct trusted signers recorded for the fingerprint.
    pub quorum: usize,
    pub required_quorum: usize,
    /// Quorum reached (now or earlier).
    pub verified: bool,
    pub bootstrap: bool,
    /// This submission caused the promotion.
    pub promoted: bool,
    pub fingerprint: Fingerprint,
}
