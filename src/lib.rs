//! Command routing and response aggregation for clustered Valkey clients.
//!
//! A caller names a command and, optionally, a [`Route`]. The
//! [`ClusterClient`] hands both to an [`ExecutionBridge`], which does the
//! network work, and classifies the reply into a [`ClusterValue`] whose
//! variant follows the route's cardinality.
//!
//! ## Architecture
//!
//! - `route`: targeting intent and the multi-node predicate
//! - `bridge`: the engine seam and the `fred`-backed engine
//! - `cluster_value`: single-or-per-node results and reply classification
//! - `client`: the public command facade
//! - `script`: script handles over the engine's script cache
//! - `scan`: cursor state for cluster-wide key scans
//! - `options`, `request`, `value`: arguments, logical commands, reply values
//! - `error`, `metrics`, `parsing`: error taxonomy, Prometheus metrics, INFO parsing

pub mod bridge;
pub mod client;
pub mod cluster_value;
pub mod error;
pub mod metrics;
pub mod options;
pub mod parsing;
pub mod request;
pub mod route;
pub mod scan;
pub mod script;
pub mod value;

pub use bridge::{BridgeConfig, ExecutionBridge, FredBridge, RawResponse, TlsConfig};
pub use client::ClusterClient;
pub use cluster_value::ClusterValue;
pub use error::{BridgeError, ClientError, DecodeError, Result};
pub use metrics::CommandMetrics;
pub use options::{
    ClusterInfoOptions, ClusterPingOptions, ClusterScriptOptions, FlushMode, InfoOptions,
    ObjectType, PingOptions, RouteOption, ScanOptions, ScriptArgOptions, ScriptFlushOptions,
    ScriptOptions, Section,
};
pub use request::RequestType;
pub use route::{NodeAddress, Route, RouteError, SlotType};
pub use scan::ClusterScanCursor;
pub use script::Script;
pub use value::Value;
