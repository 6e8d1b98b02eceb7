use shared_types::PeerRecord;
use std::collections::HashMap;

/// Keep one record per `(ip, port)`.
///
/// The winner has the greatest `last_seen`; equal `last_seen` is broken by
/// the greater `height`. Output order follows first appearance of each
/// endpoint.
pub fn dedupe_by_endpoint(records: Vec<PeerRecord>) -> Vec<PeerRecord> {
    let mut slot_by_endpoint: HashMap<(String, u16), usize> = HashMap::new();
    let mut winners: Vec<PeerRecord> = Vec::new();

    for record in records {
        let key = (record.ip.clone(), record.port);
        match slot_by_endpoint.get(&key) {
            Some(&slot) => {
                let current = &winners[slot];
                if (record.last_seen, record.height) > (current.last_seen, current.height) {
                    winners[slot] = record;
                }
            }
            None => {
                slot_by_endpoint.insert(key, winners.len());
                winners.push(record);
            }
        }
    }

    winners
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn peer(node: &str, ip: &str, port: u16, last_seen: u64, height: u64) -> PeerRecord {
        PeerRecord {
            ip: ip.into(),
            port,
            node_id: node.into(),
            version: "1.0".into(),
            height,
            last_seen,
            first_seen: None,
            seen_count: None,
            stats_port: None,
            latency_ms: None,
            signature: "sig".into(),
        }
    }

    #[test]
    fn test_latest_announcement_wins() {
        let out = dedupe_by_endpoint(vec![
            peer("old", "1.1.1.1", 9000, 100, 50),
            peer("new", "1.1.1.1", 9000, 200, 10),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].node_id, "new");
    }

    #[test]
    fn test_height_breaks_last_seen_tie() {
        let out = dedupe_by_endpoint(vec![
            peer("tall", "1.1.1.1", 9000, 100, 60),
            peer("short", "1.1.1.1", 9000, 100, 10),
            peer("taller", "1.1.1.1", 9000, 100, 61),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].node_id, "taller");
    }

    #[test]
    fn test_older_but_taller_does_not_win() {
        let out = dedupe_by_endpoint(vec![
            peer("fresh", "1.1.1.1", 9000, 200, 10),
            peer("stale", "1.1.1.1", 9000, 100, 999),
        ]);
        assert_eq!(out[0].node_id, "fresh");
    }

    #[test]
    fn test_distinct_ports_are_distinct_endpoints() {
        let out = dedupe_by_endpoint(vec![
            peer("a", "1.1.1.1", 9000, 1, 1),
            peer("b", "1.1.1.1", 9001, 1, 1),
            peer("c", "2.2.2.2", 9000, 1, 1),
            peer("d", "2.2.2.2", 9000, 2, 1),
        ]);
        let endpoints: HashSet<String> = out.iter().map(|p| p.endpoint()).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(endpoints.len(), 3);
    }
}
