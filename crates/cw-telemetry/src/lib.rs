//! # Chainwatch Telemetry
//!
//! Logging and metrics shared by every gateway crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cw_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CW_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CW_JSON_LOGS` | `true` in containers | JSON formatted logs |
//! | `CW_SERVICE_NAME` | `chainwatch-gateway` | Service name field |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ANNOUNCEMENTS, HEADER_SUBMISSIONS,
    PEER_PROBES, QUORUM_PROMOTIONS, RATE_LIMITED, STATS_SUBMISSIONS, STATUS_CACHE,
    STATUS_SELECTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;
    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "telemetry initialized"
    );
    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chainwatch-gateway");
    }

    #[test]
    fn test_metric_inc_macro() {
        metric_inc!(QUORUM_PROMOTIONS);
        metric_inc!(ANNOUNCEMENTS, &["accepted"]);
        assert!(QUORUM_PROMOTIONS.get() >= 1.0);
        assert!(ANNOUNCEMENTS.with_label_values(&["accepted"]).get() >= 1.0);
    }
}
