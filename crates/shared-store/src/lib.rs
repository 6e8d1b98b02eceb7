//! # Shared Store
//!
//! The durable key-value collaborator every gateway subsystem persists
//! through.
//!
//! - [`KvStore`]: async port over JSON values with per-key TTLs and string
//!   sets.
//! - [`KvStoreExt`]: typed `get_json` / `set_json` / `mget_json` helpers.
//! - [`MemoryStore`]: `DashMap` adapter with lazy expiry driven by a
//!   [`shared_types::TimeSource`].
//! - [`keys`]: the key layout shared by all writers.

pub mod errors;
pub mod keys;
pub mod memory;
pub mod ports;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use ports::{KvStore, KvStoreExt};
