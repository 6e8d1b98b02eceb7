//! Registry errors.

use shared_store::StoreError;
use shared_types::EntityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid peer record: {0}")]
    InvalidRecord(#[from] EntityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
