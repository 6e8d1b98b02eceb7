//! Domain Layer - quorum arithmetic and header validation, no I/O.

pub mod errors;
pub mod header_chain;
pub mod outcome;
pub mod policy;

pub use errors::*;
pub use outcome::*;
pub use policy::*;
