use cw_01_peer_registry::RegistryError;
use cw_02_snapshot_quorum::QuorumError;
use shared_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream timed out")]
    Timeout,

    #[error("malformed telemetry: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),
}
