//! # Source Selection
//!
//! Pure reconciliation of the candidates gathered for one status read.
//! Nothing here touches the network or the store; the service feeds in
//! what it collected and keeps the returned [`StickySelection`].

use crate::domain::stats::{Candidate, StatusSource, TelemetryStats};
use serde::{Deserialize, Serialize};
use shared_types::{HeaderSnapshot, PendingSnapshot};

/// Tunables for [`select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRules {
    pub signed_snapshot_max_lag: u64,
    pub stats_max_age_secs: u64,
    pub source_sticky_secs: u64,
    pub source_switch_min_height_delta: u64,
    pub stale_secs: u64,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            signed_snapshot_max_lag: 2,
            stats_max_age_secs: 600,
            source_sticky_secs: 6,
            source_switch_min_height_delta: 2,
            stale_secs: 900,
        }
    }
}

/// The previous decision, kept to damp flapping between sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickySelection {
    pub source: StatusSource,
    pub height: u64,
    pub expires_at: u64,
}

impl StickySelection {
    pub fn is_active(&self, now: u64) -> bool {
        self.expires_at >= now
    }
}

/// Verification state reported alongside a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyState {
    Verified,
    Pending,
}

impl VerifyState {
    pub fn from_verified(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::Pending
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Verified => "signed_snapshot_available",
            Self::Pending => "awaiting_signed_snapshot_quorum",
        }
    }
}

/// Outcome of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub source: StatusSource,
    pub stats: Option<TelemetryStats>,
    /// Canonical snapshot, or the top pending one when `source` is pending.
    pub snapshot: Option<HeaderSnapshot>,
    pub verified: bool,
    pub last_updated: u64,
    /// Only set on the fallback branch.
    pub stale: Option<bool>,
    pub sticky: StickySelection,
}

impl Selection {
    pub fn verify_state(&self) -> VerifyState {
        VerifyState::from_verified(self.verified)
    }
}

/// Drop network candidates that disagree with signed data or are too old,
/// then order the survivors best-first (height, then `last_block_time`).
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    signed_height: u64,
    now: u64,
    rules: &SelectionRules,
) -> Vec<Candidate> {
    let mut survivors: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            signed_height == 0 || c.stats.height.abs_diff(signed_height) <= rules.signed_snapshot_max_lag
        })
        .filter(|c| match c.stats.observed_at() {
            Some(at) => now.saturating_sub(at) <= rules.stats_max_age_secs,
            None => false,
        })
        .collect();

    survivors.sort_by(|a, b| {
        b.stats
            .height
            .cmp(&a.stats.height)
            .then(b.stats.last_block_time.cmp(&a.stats.last_block_time))
    });
    survivors
}

/// Pick the best surviving candidate, honouring an active sticky source.
fn best_network<'a>(
    survivors: &'a [Candidate],
    sticky: Option<&StickySelection>,
    now: u64,
    rules: &SelectionRules,
) -> Option<&'a Candidate> {
    let best = survivors.first()?;
    let Some(sticky) = sticky.filter(|s| s.is_active(now)) else {
        return Some(best);
    };
    match survivors.iter().find(|c| c.source == sticky.source) {
        Some(held)
            if held
                .stats
                .height
                .saturating_add(rules.source_switch_min_height_delta)
                >= best.stats.height =>
        {
            Some(held)
        }
        _ => Some(best),
    }
}

/// Reconcile candidates with the signed state.
///
/// Precedence: canonical snapshot, then a network candidate strictly taller
/// than the top pending snapshot, then the top pending snapshot, then the
/// empty fallback.
pub fn select(
    candidates: Vec<Candidate>,
    canonical: Option<&HeaderSnapshot>,
    top_pending: Option<&PendingSnapshot>,
    sticky: Option<&StickySelection>,
    now: u64,
    rules: &SelectionRules,
) -> Selection {
    let pending_height = top_pending.map(|p| p.snapshot.height);
    let signed_height = canonical
        .map(|s| s.height)
        .max(pending_height)
        .unwrap_or(0);

    let survivors = filter_candidates(candidates, signed_height, now, rules);
    let network = best_network(&survivors, sticky, now, rules);

    let hold = |source: StatusSource, height: u64| StickySelection {
        source,
        height,
        expires_at: now + rules.source_sticky_secs,
    };

    if let Some(snapshot) = canonical {
        let beats_pending = pending_height.map_or(true, |h| snapshot.height >= h);
        let beats_network = network.map_or(true, |c| snapshot.height >= c.stats.height);
        if beats_pending && beats_network {
            return Selection {
                source: StatusSource::Snapshot,
                stats: Some(TelemetryStats::from(snapshot)),
                snapshot: Some(snapshot.clone()),
                verified: true,
                last_updated: nonzero_or(snapshot.received_at, now),
                stale: None,
                sticky: hold(StatusSource::Snapshot, snapshot.height),
            };
        }
    }

    if let Some(best) = network {
        if pending_height.map_or(true, |h| best.stats.height > h) {
            let verified = best.source == StatusSource::Indexer || canonical.is_some();
            return Selection {
                source: best.source,
                stats: Some(best.stats.clone()),
                snapshot: canonical.cloned(),
                verified,
                last_updated: best.stats.observed_at().unwrap_or(now),
                stale: None,
                sticky: hold(best.source, best.stats.height),
            };
        }
    }

    if let Some(pending) = top_pending {
        return Selection {
            source: StatusSource::Pending,
            stats: Some(TelemetryStats::from(&pending.snapshot)),
            snapshot: Some(pending.snapshot.clone()),
            verified: false,
            last_updated: nonzero_or(pending.received_at, now),
            stale: None,
            sticky: hold(StatusSource::Pending, pending.snapshot.height),
        };
    }

    let last_updated = canonical.map(|s| s.received_at).unwrap_or(0);
    let stale = last_updated == 0 || now.saturating_sub(last_updated) > rules.stale_secs;
    let source = if canonical.is_some() {
        StatusSource::Snapshot
    } else {
        StatusSource::Pending
    };
    Selection {
        source,
        stats: canonical.map(TelemetryStats::from),
        snapshot: canonical.cloned(),
        verified: canonical.is_some(),
        last_updated,
        stale: Some(stale),
        sticky: hold(source, canonical.map(|s| s.height).unwrap_or(0)),
    }
}

fn nonzero_or(value: u64, fallback: u64) -> u64 {
    if value > 0 {
        value
    } else {
        fallback
    }
}
