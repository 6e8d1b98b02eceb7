//! Domain layer: configuration, error codes and request decoding.

pub mod config;
pub mod error;
pub mod payload;
pub mod requests;

pub use config::*;
pub use error::{codes, ApiError, ApiResult, GatewayError};
pub use payload::FieldReader;
pub use requests::*;
