//! # Snapshot Quorum Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Nodes submit signed header snapshots. Identical snapshots (same
//! [`shared_types::Fingerprint`]) accumulate signer attestations inside a
//! quorum window; once enough *trusted* signers agree, the snapshot is
//! promoted to the canonical chain status and appended to a bounded history.
//!
//! This is attestation counting, not consensus: there are no rounds, views
//! or penalties. Untrusted signers are recorded but never counted.
//!
//! ## Modules
//!
//! - [`domain::header_chain`]: structural validation of a header segment
//! - [`domain::policy`]: required-quorum arithmetic and bootstrap mode
//! - [`service`]: [`SnapshotQuorumEngine`], the stateful engine over the store

pub mod config;
pub mod domain;
pub mod service;

pub use config::QuorumConfig;
pub use domain::{
    header_chain::{validate, MAX_HEADERS},
    ChainError, QuorumError, QuorumOutcome, QuorumPolicy,
};
pub use service::SnapshotQuorumEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
