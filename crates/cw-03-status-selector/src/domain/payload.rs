use crate::domain::selection::{Selection, VerifyState};
use crate::domain::stats::{StatusSource, TelemetryStats};
use serde::{Deserialize, Serialize};
use shared_types::HeaderSnapshot;

/// Which inputs were present when the status was computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub announce_peers: u64,
    pub has_pushed_stats: bool,
    pub has_peer_stats: bool,
    pub has_snapshot: bool,
    pub has_pending: bool,
}

/// Body of `GET /chain-snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub ok: bool,
    pub source: StatusSource,
    pub peers: u64,
    pub stats: Option<TelemetryStats>,
    pub snapshot: Option<HeaderSnapshot>,
    pub verified: bool,
    pub verify_state: VerifyState,
    pub verify_reason: String,
    pub last_updated: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
    pub diagnostics: Diagnostics,
}

impl StatusPayload {
    pub fn from_selection(selection: Selection, peers: u64, diagnostics: Diagnostics) -> Self {
        let verify_state = selection.verify_state();
        Self {
            ok: true,
            source: selection.source,
            peers,
            stats: selection.stats,
            snapshot: selection.snapshot,
            verified: selection.verified,
            verify_state,
            verify_reason: verify_state.reason().to_string(),
            last_updated: selection.last_updated,
            stale: selection.stale,
            diagnostics,
        }
    }
}

/// Largest peer count reported by the announcer set or any candidate.
pub fn reconcile_peer_count<'a>(
    announce_peers: u64,
    candidates: impl IntoIterator<Item = &'a TelemetryStats>,
) -> u64 {
    candidates
        .into_iter()
        .filter_map(|s| s.peers)
        .fold(announce_peers, u64::max)
}
