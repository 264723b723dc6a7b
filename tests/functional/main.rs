// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for the command facade and script handles.
//!
//! These tests drive `ClusterClient` and `Script` against a recording mock
//! engine, so they need no running cluster.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run a single test with output
//! cargo test --test functional test_info_without_route_is_multi -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! - **Facade tests**: route-driven result shapes, argument assembly, error
//!   propagation and metrics
//! - **Scan tests**: primary order, cursor hand-off and termination of
//!   cluster-wide key scans
//! - **Script tests**: content addressing, idempotent close, empty-input
//!   short-circuits and concurrent close races


mod script_tests;

pub use mock_bridge::*;

use std::sync::Arc;

use valkey_cluster_client::ClusterClient;

/// A client over a fresh mock engine, plus the engine for inspection.
pub fn mock_client() -> (ClusterClient, Arc<MockBridge>) {
    let bridge = Arc::new(MockBridge::new());
    let client = ClusterClient::new(bridge.clone());
    (client, bridge)
}

/// Build an owned argument vector.
pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
