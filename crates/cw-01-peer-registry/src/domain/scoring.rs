//! # Peer Scoring
//!
//! Ranks announced peers by how useful they are to a syncing client.
//!
//! ## Components
//!
//! | Term | Weight |
//! |------|--------|
//! | height | `+0.001` per block |
//! | recency | `-0.01` per second since `last_seen` |
//! | latency | `-0.005` per ms (50 ms when unreported) |
//! | uptime | up to `+6` over the first day since `first_seen` |
//! | consistency | `min(6, 3·log10(seen_count + 1))` |
//! | newcomer | `-5` while uptime is under 15 minutes |

use shared_types::PeerRecord;

const HEIGHT_WEIGHT: f64 = 0.001;
const RECENCY_WEIGHT: f64 = 0.01;
const LATENCY_WEIGHT: f64 = 0.005;
const DEFAULT_LATENCY_MS: f64 = 50.0;
const UPTIME_FULL_SECS: f64 = 86_400.0;
const UPTIME_WEIGHT: f64 = 6.0;
const CONSISTENCY_CAP: f64 = 6.0;
const NEW_PEER_SECS: u64 = 900;
const NEW_PEER_PENALTY: f64 = 5.0;

/// Score a peer at time `now` (seconds).
pub fn score(peer: &PeerRecord, now: u64) -> f64 {
    let age = now.saturating_sub(peer.last_seen) as f64;
    let uptime_secs = now.saturating_sub(peer.first_seen_or_last());
    let uptime = uptime_secs as f64;
    let seen_count = peer.seen_count_or_one() as f64;
    let latency = peer
        .latency_ms
        .filter(|l| l.is_finite())
        .unwrap_or(DEFAULT_LATENCY_MS);

    let height_score = peer.height as f64 * HEIGHT_WEIGHT;
    let recency_score = -age * RECENCY_WEIGHT;
    let latency_penalty = -latency * LATENCY_WEIGHT;
    let uptime_score = (uptime / UPTIME_FULL_SECS).min(1.0) * UPTIME_WEIGHT;
    let consistency_score = ((seen_count + 1.0).log10() * 3.0).min(CONSISTENCY_CAP);
    let new_peer_penalty = if uptime_secs < NEW_PEER_SECS {
        -NEW_PEER_PENALTY
    } else {
        0.0
    };

    height_score + recency_score + latency_penalty + uptime_score + consistency_score + new_peer_penalty
}

/// Drop records with an invalid port and order the rest by score,
/// highest first. Equal scores keep their input order.
pub fn rank(records: Vec<PeerRecord>, now: u64) -> Vec<PeerRecord> {
    let mut scored: Vec<(f64, PeerRecord)> = records
        .into_iter()
        .filter(PeerRecord::has_valid_port)
        .map(|p| (score(&p, now), p))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, p)| p).collect()
}
