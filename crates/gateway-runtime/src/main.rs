//! # Chainwatch Gateway
//!
//! Entry point for the discovery-and-attestation gateway. See the library
//! crate for the startup sequence.

use anyhow::{Context, Result};
use cw_telemetry::{init_telemetry, TelemetryConfig};
use gateway_runtime::{load_config, shutdown_signal, GatewayRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("failed to load configuration")?;

    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let runtime = GatewayRuntime::new(config)?;
    info!("Gateway is running. Press Ctrl+C to stop.");
    runtime.run(shutdown_signal()).await
}
