//! # Shared Types Crate
//!
//! Entities owned by the storage collaborator and passed between the
//! gateway subsystems, plus the [`TimeSource`] port every subsystem reads
//! the clock through.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every persisted record shape is defined here.
//! - **Deterministic time**: no subsystem calls `SystemTime::now()` directly;
//!   tests drive TTLs, windows and stickiness with [`ManualTimeSource`].

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
