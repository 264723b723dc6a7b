//! Route-aware command facade.
//!
//! [`ClusterClient`] composes options, an optional [`Route`], one bridge call
//! and the reply classifier into each public operation. It never retries and
//! never aggregates partial results: whatever the engine reports is returned
//! as-is.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::bridge::topology::ClusterTopology;
use crate::bridge::{BridgeConfig, ExecutionBridge, FredBridge, RawResponse};
use crate::cluster_value::ClusterValue;
use crate::error::{BridgeError, ClientError, DecodeError, Result};
use crate::metrics::CommandMetrics;
use crate::options::{
    ClusterInfoOptions, ClusterPingOptions, ClusterScriptOptions, ScanOptions,
    ScriptFlushOptions, ScriptOptions,
};
use crate::request::RequestType;
use crate::route::{NodeAddress, Route};
use crate::scan::{ClusterScanCursor, parse_scan_reply};
use crate::script::Script;
use crate::value::Value;

/// Client for a Valkey cluster.
#[derive(Clone)]
pub struct ClusterClient {
    bridge: Arc<dyn ExecutionBridge>,
    metrics: Arc<CommandMetrics>,
}

impl ClusterClient {
    /// Create a client over an existing engine.
    pub fn new(bridge: Arc<dyn ExecutionBridge>) -> Self {
        Self::with_metrics(bridge, Arc::new(CommandMetrics::new()))
    }

    /// Create a client that records into shared metrics.
    pub fn with_metrics(bridge: Arc<dyn ExecutionBridge>, metrics: Arc<CommandMetrics>) -> Self {
        Self { bridge, metrics }
    }

    /// Connect a `fred`-backed engine and wrap it.
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        let bridge = FredBridge::connect(config)?;
        Ok(Self::new(Arc::new(bridge)))
    }

    pub fn bridge(&self) -> &Arc<dyn ExecutionBridge> {
        &self.bridge
    }

    pub fn metrics(&self) -> &Arc<CommandMetrics> {
        &self.metrics
    }

    /// Run `op` and record its outcome under `command`.
    fn observe<T>(&self, command: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = op();
        let error_kind = result.as_ref().err().map(ClientError::kind);
        self.metrics
            .record(command, start.elapsed().as_secs_f64(), error_kind);
        if let Err(ref e) = result {
            debug!(command, error = %e, "Command failed");
        }
        result
    }

    fn execute(
        &self,
        request: RequestType,
        args: &[String],
        route: Option<&Route>,
    ) -> Result<RawResponse> {
        let raw = match route {
            Some(route) => self.bridge.execute_with_route(request, args, route)?,
            None => self.bridge.execute(request, args)?,
        };
        Ok(raw)
    }

    /// Run an arbitrary command under its default routing.
    ///
    /// `args` holds the command name followed by its arguments and is passed
    /// through uninterpreted.
    #[instrument(skip(self, args), fields(command = args.first().map(String::as_str).unwrap_or_default()))]
    pub fn custom_command(&self, args: &[String]) -> Result<ClusterValue<Value>> {
        self.observe(RequestType::CustomCommand.name(), || {
            self.run_custom(args, None)
        })
    }

    /// Run an arbitrary command on the nodes named by `route`.
    #[instrument(skip(self, args), fields(command = args.first().map(String::as_str).unwrap_or_default(), route = %route))]
    pub fn custom_command_with_route(
        &self,
        args: &[String],
        route: &Route,
    ) -> Result<ClusterValue<Value>> {
        self.observe(RequestType::CustomCommand.name(), || {
            self.run_custom(args, Some(route))
        })
    }

    fn run_custom(&self, args: &[String], route: Option<&Route>) -> Result<ClusterValue<Value>> {
        if args.is_empty() {
            return Err(ClientError::Misuse(
                "custom command needs at least a command name".to_string(),
            ));
        }
        let raw = self.execute(RequestType::CustomCommand, args, route)?;
        Ok(ClusterValue::classify(raw, route)?)
    }

    /// `INFO` from every primary, keyed by node address.
    #[instrument(skip(self))]
    pub fn info(&self) -> Result<HashMap<String, String>> {
        self.observe(RequestType::Info.name(), || {
            let raw = self.execute(RequestType::Info, &[], None)?;
            Ok(raw.into_string_map()?)
        })
    }

    /// `INFO` with sections and an optional route.
    ///
    /// Without a route or with a multi-node route the reply must be a
    /// per-node map and comes back as `Multi`. A single-node route must
    /// produce one string and comes back as `Single`.
    #[instrument(skip(self, options), fields(route = ?options.route()))]
    pub fn info_with_options(&self, options: &ClusterInfoOptions) -> Result<ClusterValue<String>> {
        self.observe(RequestType::Info.name(), || {
            let route = options.route();
            let raw = self.execute(RequestType::Info, &options.info_options.to_args(), route)?;
            Ok(ClusterValue::decode_strings(raw, route)?)
        })
    }

    /// `PING` under default routing.
    #[instrument(skip(self))]
    pub fn ping(&self) -> Result<String> {
        self.observe(RequestType::Ping.name(), || {
            let raw = self.execute(RequestType::Ping, &[], None)?;
            Ok(raw.into_string()?)
        })
    }

    /// `PING` with an optional message and route. The reply is always one
    /// string: the message, or `PONG` without one.
    #[instrument(skip(self, options), fields(route = ?options.route()))]
    pub fn ping_with_options(&self, options: &ClusterPingOptions) -> Result<String> {
        self.observe(RequestType::Ping.name(), || {
            let raw = self.execute(
                RequestType::Ping,
                &options.ping_options.to_args(),
                options.route(),
            )?;
            Ok(raw.into_string()?)
        })
    }

    /// Register a script body with the engine.
    #[instrument(skip(self, code))]
    pub fn create_script(&self, code: impl AsRef<[u8]>) -> Script {
        Script::register(
            Arc::clone(&self.bridge),
            code.as_ref(),
            Some(Arc::clone(&self.metrics)),
        )
    }

    /// Invoke a script, routed by its first key.
    #[instrument(skip(self, options), fields(hash = script.hash(), keys = options.keys.len()))]
    pub fn invoke_script(&self, script: &Script, options: &ScriptOptions) -> Result<Value> {
        self.observe("invoke_script", || {
            ensure_open(script)?;
            let raw =
                self.bridge
                    .invoke_script(script.hash(), &options.keys, &options.args, None)?;
            match raw {
                RawResponse::Scalar(value) => Ok(value),
                RawResponse::PerNode(map) => {
                    Err(DecodeError::UnexpectedPerNode { nodes: map.len() }.into())
                }
            }
        })
    }

    /// Invoke a keyless script with an optional route.
    #[instrument(skip(self, options), fields(hash = script.hash(), route = ?options.route()))]
    pub fn invoke_script_with_route(
        &self,
        script: &Script,
        options: &ClusterScriptOptions,
    ) -> Result<ClusterValue<Value>> {
        self.observe("invoke_script", || {
            ensure_open(script)?;
            let route = options.route();
            let raw = self.bridge.invoke_script(
                script.hash(),
                &[],
                &options.script_arg_options.args,
                route,
            )?;
            Ok(ClusterValue::classify(raw, route)?)
        })
    }

    /// Flush the server-side script cache.
    #[instrument(skip(self, options), fields(mode = ?options.mode, route = ?options.route()))]
    pub fn script_flush(&self, options: &ScriptFlushOptions) -> Result<String> {
        self.observe(RequestType::ScriptFlush.name(), || {
            let raw = self.execute(RequestType::ScriptFlush, &options.to_args(), options.route())?;
            Ok(raw.into_string()?)
        })
    }

    /// Read one page of a key scan across every primary.
    ///
    /// Start from [`ClusterScanCursor::new`] and pass each returned cursor
    /// back in until it reports finished. Pages may be empty before the end.
    /// Primaries are walked one at a time in address order, so keys that
    /// migrate between primaries mid-scan can be missed or seen twice.
    #[instrument(skip(self, cursor, options), fields(node = ?cursor.current_node()))]
    pub fn cluster_scan(
        &self,
        cursor: ClusterScanCursor,
        options: &ScanOptions,
    ) -> Result<(ClusterScanCursor, Vec<Value>)> {
        self.observe("cluster_scan", || {
            if cursor.is_finished() {
                return Err(ClientError::Misuse(
                    "cluster scan has already finished".to_string(),
                ));
            }
            let cursor = if cursor.is_initial() {
                ClusterScanCursor::start(self.scan_targets()?)
            } else {
                cursor
            };
            let Some((node, node_cursor)) = cursor.next_request() else {
                return Ok((cursor, Vec::new()));
            };

            let mut line = vec!["SCAN".to_string(), node_cursor];
            line.extend(options.to_args());
            let route = Route::by_address(node.host, node.port);
            let raw = self.execute(RequestType::CustomCommand, &line, Some(&route))?;
            let (next, keys) = match raw {
                RawResponse::Scalar(value) => parse_scan_reply(value)?,
                RawResponse::PerNode(map) => {
                    return Err(DecodeError::UnexpectedPerNode { nodes: map.len() }.into());
                }
            };
            Ok((cursor.advance(next), keys))
        })
    }

    /// Slot-owning primaries in address order.
    fn scan_targets(&self) -> Result<Vec<NodeAddress>> {
        let line = ["CLUSTER".to_string(), "NODES".to_string()];
        let raw = self.execute(RequestType::CustomCommand, &line, Some(&Route::Random))?;
        let topology = ClusterTopology::parse(&raw.into_string()?)
            .map_err(|e| BridgeError::Routing(e.to_string()))?;

        let mut nodes: Vec<NodeAddress> = topology
            .primaries()
            .into_iter()
            .filter(|node| !node.slots.is_empty())
            .map(|node| node.address.clone())
            .collect();
        nodes.sort();
        nodes.dedup();
        debug!(primaries = nodes.len(), "Starting cluster scan");
        Ok(nodes)
    }
}

fn ensure_open(script: &Script) -> Result<()> {
    if script.is_closed() {
        return Err(ClientError::Misuse(format!(
            "script {} has been closed",
            script.hash()
        )));
    }
    Ok(())
}
