//! Key layout.
//!
//! | Key | Holds |
//! |-----|-------|
//! | `peer:<node_id>` | `PeerRecord` |
//! | `peers:index` | set of peer keys |
//! | `chain:snapshot` | canonical `HeaderSnapshot` |
//! | `chain:pending:<fingerprint>` | `PendingSnapshot` |
//! | `chain:pending:index` | set of pending keys |
//! | `chain:history` | newest-first list of `HeaderSnapshot` |
//! | `stats:<node_id>` | `StatsSnapshot` |
//! | `stats:index` | set of stats keys |
//! | `stats:latest` | most recently pushed `StatsSnapshot` |
//! | `bootstrap:latest` | `BootstrapPointer` |
//! | `rl:<scope>:<identity>` | fixed-window counter |

pub const PEER_INDEX: &str = "peers:index";
pub const SNAPSHOT: &str = "chain:snapshot";
pub const PENDING_INDEX: &str = "chain:pending:index";
pub const HISTORY: &str = "chain:history";
pub const STATS_INDEX: &str = "stats:index";
pub const STATS_LATEST: &str = "stats:latest";
pub const BOOTSTRAP_LATEST: &str = "bootstrap:latest";

pub fn peer(node_id: &str) -> String {
    format!("peer:{node_id}")
}

pub fn pending(fingerprint: &str) -> String {
    format!("chain:pending:{fingerprint}")
}

pub fn stats(node_id: &str) -> String {
    format!("stats:{node_id}")
}

pub fn rate_limit(scope: &str, identity: &str) -> String {
    format!("rl:{scope}:{identity}")
}
