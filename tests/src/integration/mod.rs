//! Cross-crate flows.

#[cfg(test)]
mod fixtures;
mod gateway_flows;
mod quorum_flows;
