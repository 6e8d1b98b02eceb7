//! # Chainwatch Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── gateway_benchmarks.rs   # criterion: signatures, chain checks, ranking
//! └── src/integration/
//!     ├── fixtures.rs             # signers, header segments, fakes
//!     ├── quorum_flows.rs         # registry + quorum + selector, no HTTP
//!     └── gateway_flows.rs        # full node lifecycle over the router
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cw-tests
//!
//! # By category
//! cargo test -p cw-tests integration::quorum_flows
//! cargo test -p cw-tests integration::gateway_flows
//!
//! # Benchmarks
//! cargo bench -p cw-tests
//! ```

pub mod integration;
