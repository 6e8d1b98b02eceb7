//! # Outbound Ports
//!
//! Upstream telemetry sources. Production adapters live in
//! [`crate::adapters`]; tests substitute in-process fakes.

use crate::domain::SelectorError;
use async_trait::async_trait;
use serde_json::Value;
use std::net::Ipv4Addr;

/// External indexer exposing chain stats as JSON.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    async fn fetch(&self) -> Result<Value, SelectorError>;
}

/// A node's self-reported `/stats` endpoint.
#[async_trait]
pub trait StatsProbe: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr, port: u16) -> Result<Value, SelectorError>;
}
