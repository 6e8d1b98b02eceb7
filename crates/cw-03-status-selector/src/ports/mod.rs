//! Ports Layer - outbound dependencies of the selector.

pub mod outbound;

pub use outbound::*;
