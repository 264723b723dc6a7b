//! Execution bridge: the seam between command routing and the engine that
//! talks to cluster nodes.
//!
//! The facade only ever sees [`ExecutionBridge`]. Every method is a blocking
//! call; the calling thread waits until the engine answers or fails.
//!
//! ## Architecture
//!
//! - `response`: [`RawResponse`] and its strict decoders
//! - `policy`: per-command default routing and response aggregation
//! - `script_cache`: content-addressed script storage inside the engine
//! - `topology`: `CLUSTER NODES` parsing used to resolve fan-out targets
//! - `fred_bridge`: the `fred`-backed engine

pub mod fred_bridge;
pub mod policy;
pub mod response;
pub mod script_cache;
pub mod topology;

pub use fred_bridge::{BridgeConfig, FredBridge, TlsConfig};
pub use policy::{DefaultRouting, ResponsePolicy};
pub use response::RawResponse;
pub use script_cache::ScriptCache;

use crate::error::BridgeError;
use crate::request::RequestType;
use crate::route::Route;

/// Synchronous call contract implemented by an execution engine.
pub trait ExecutionBridge: Send + Sync {
    /// Run `request` under the command's default routing policy.
    fn execute(&self, request: RequestType, args: &[String]) -> Result<RawResponse, BridgeError>;

    /// Run `request` on the nodes named by `route`.
    fn execute_with_route(
        &self,
        request: RequestType,
        args: &[String],
        route: &Route,
    ) -> Result<RawResponse, BridgeError>;

    /// Register a script body in the engine's cache and return its hash.
    ///
    /// Callers never pass an empty body.
    fn store_script(&self, code: &[u8]) -> String;

    /// Remove a script from the engine's cache.
    ///
    /// Callers never pass an empty hash.
    fn drop_script(&self, hash: &str) -> Result<(), BridgeError>;

    /// Run a cached script by hash. Without a route the engine routes by the
    /// first key.
    fn invoke_script(
        &self,
        hash: &str,
        keys: &[String],
        args: &[String],
        route: Option<&Route>,
    ) -> Result<RawResponse, BridgeError>;
}
