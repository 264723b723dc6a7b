// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Integration tests for valkey-cluster-client
//!
//! These tests require a running Valkey cluster. Seed nodes are read from
//! `VALKEY_CLUSTER_HOSTS` (comma-separated `host:port`, default
//! `127.0.0.1:7000`). Tests are marked with #[ignore] and must be run
//! explicitly:
//!
//! ```bash
//! # Run all integration tests
//! VALKEY_CLUSTER_HOSTS=127.0.0.1:7000,127.0.0.1:7001 cargo test --test integration -- --ignored
//!
//! # Run with engine logs
//! RUST_LOG=valkey_cluster_client=debug cargo test --test integration -- --ignored --nocapture
//! ```

mod facade_tests;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use valkey_cluster_client::{BridgeConfig, ClusterClient, NodeAddress};

static INIT_TRACING: Once = Once::new();

/// Initialize a test subscriber once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("valkey_cluster_client=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Seed hosts from the environment.
pub fn cluster_hosts() -> Vec<NodeAddress> {
    let raw = std::env::var("VALKEY_CLUSTER_HOSTS").unwrap_or_else(|_| "127.0.0.1:7000".into());
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse().expect("VALKEY_CLUSTER_HOSTS entries must be host:port"))
        .collect()
}

/// Connect a client to the test cluster.
pub fn connect() -> ClusterClient {
    init_tracing();
    let mut config = BridgeConfig::new(cluster_hosts())
        .with_connection_timeout(Duration::from_secs(5))
        .with_command_timeout(Duration::from_secs(10));
    if let Ok(password) = std::env::var("VALKEY_PASSWORD") {
        config = config.with_password(password);
    }
    ClusterClient::connect(config).expect("failed to connect to test cluster")
}

/// Build an owned argument vector.
pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// A key unique to this test run.
pub fn unique_key(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}:{nanos}")
}
