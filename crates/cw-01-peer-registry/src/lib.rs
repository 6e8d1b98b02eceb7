//! # Peer Registry Subsystem
//!
//! **Subsystem ID:** 1
//!
//! Holds the most recent signed announcement of every node and turns the
//! noisy, self-reported set into a ranked, deduplicated peer list.
//!
//! ## Architecture
//!
//! - **Domain Layer:** scoring, ranking, endpoint dedupe, probe eligibility
//!   (pure functions, no I/O)
//! - **Service Layer:** [`PeerRegistry`] persists records through the
//!   [`shared_store::KvStore`] port
//!
//! ## Example
//!
//! ```rust
//! use cw_01_peer_registry::{dedupe_by_endpoint, rank};
//! use shared_types::PeerRecord;
//!
//! let peers: Vec<PeerRecord> = Vec::new();
//! let ranked = rank(dedupe_by_endpoint(peers), 1_700_000_000);
//! assert!(ranked.is_empty());
//! ```

pub mod config;
pub mod domain;
pub mod service;

pub use config::RegistryConfig;
pub use domain::*;
pub use service::PeerRegistry;
