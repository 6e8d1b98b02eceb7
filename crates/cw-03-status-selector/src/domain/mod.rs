//! Domain Layer - candidate shapes and the pure selection rules.

pub mod announce;
pub mod errors;
pub mod payload;
pub mod selection;
pub mod stats;

pub use announce::*;
pub use errors::*;
pub use payload::*;
pub use selection::*;
pub use stats::*;
