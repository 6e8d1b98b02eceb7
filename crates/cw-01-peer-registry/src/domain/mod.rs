//! Domain Layer - Pure peer-list logic with no I/O
//!
//! - Score and rank announced peers
//! - Collapse duplicate `(ip, port)` announcements
//! - Decide which peers may be probed over HTTP

pub mod dedupe;
pub mod errors;
pub mod probe_target;
pub mod scoring;

pub use dedupe::*;
pub use errors::*;
pub use probe_target::*;
pub use scoring::*;
