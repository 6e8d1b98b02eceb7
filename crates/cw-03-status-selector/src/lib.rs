//! # Status Selector Subsystem
//!
//! **Subsystem ID:** 3
//!
//! Answers "what does the chain look like right now?" from sources that
//! disagree: an external indexer, stats pushed by nodes, live probes of
//! announced peers, and the signed snapshots held by the quorum engine.
//!
//! ## Architecture
//!
//! - **Domain Layer:** candidate normalization, lag/age filtering,
//!   hysteresis and source precedence (pure, see [`domain::select`])
//! - **Ports Layer:** [`ports::IndexerClient`], [`ports::StatsProbe`]
//! - **Adapters Layer:** reqwest implementations of both ports
//! - **Service Layer:** [`StatusService`] with its TTL cache, single-flight
//!   guard and sticky selection
//!
//! ## Precedence
//!
//! | Order | Condition | `source` | verified |
//! |-------|-----------|----------|----------|
//! | 1 | canonical ≥ top pending and ≥ best network candidate | `snapshot` | yes |
//! | 2 | best network candidate > top pending | candidate's | indexer or canonical present |
//! | 3 | a pending snapshot exists | `pending` | no |
//! | 4 | nothing else | `snapshot`/`pending` | canonical present |

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod probe;
pub mod repository;
pub mod service;

pub use adapters::{HttpIndexerClient, HttpStatsProbe};
pub use config::SelectorConfig;
pub use domain::{
    Diagnostics, SelectorError, StatusPayload, StatusSource, StickySelection, TelemetryStats,
    VerifyState,
};
pub use ports::{IndexerClient, StatsProbe};
pub use probe::{PeerProber, ProbeSettings};
pub use repository::StatsRepository;
pub use service::{StatusDependencies, StatusService};
