use crate::domain::stats::TelemetryStats;
use shared_types::PeerRecord;

/// Peer candidate derived from announcements alone, used when no probe
/// succeeds.
///
/// Considers peers seen within `max_age_secs`; reports the tallest (then
/// most recently seen) one, with `peers` set to the number of fresh
/// announcers.
pub fn announce_candidate(peers: &[PeerRecord], now: u64, max_age_secs: u64) -> Option<TelemetryStats> {
    let fresh: Vec<&PeerRecord> = peers
        .iter()
        .filter(|p| p.last_seen > 0 && now.saturating_sub(p.last_seen) <= max_age_secs)
        .collect();

    let best = fresh.iter().max_by_key(|p| (p.height, p.last_seen))?;

    Some(TelemetryStats {
        height: best.height,
        difficulty: 0.0,
        hashrate_ths: 0.0,
        last_block_time: 0,
        peers: Some(fresh.len() as u64),
        received_at: Some(best.last_seen),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(node: &str, height: u64, last_seen: u64) -> PeerRecord {
        PeerRecord {
            ip: "8.8.8.8".into(),
            port: 9000,
            node_id: node.into(),
            version: "1".into(),
            height,
            last_seen,
            first_seen: None,
            seen_count: None,
            stats_port: None,
            latency_ms: None,
            signature: "s".into(),
        }
    }

    #[test]
    fn test_tallest_fresh_peer_wins() {
        let peers = vec![peer("a", 10, 1000), peer("b", 12, 990), peer("c", 12, 995), peer("stale", 99, 100)];
        let stats = announce_candidate(&peers, 1000, 600).unwrap();
        assert_eq!(stats.height, 12);
        assert_eq!(stats.received_at, Some(995));
        assert_eq!(stats.peers, Some(3));
    }

    #[test]
    fn test_none_when_all_stale() {
        let peers = vec![peer("a", 10, 100)];
        assert!(announce_candidate(&peers, 1000, 600).is_none());
        assert!(announce_candidate(&[], 1000, 600).is_none());
    }
}
