//! Adapters Layer - reqwest implementations of the outbound ports.

pub mod http;

pub use http::{HttpIndexerClient, HttpStatsProbe};
