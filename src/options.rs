//! Argument builders for facade operations.
//!
//! These types only turn into argument vectors and an optional [`Route`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::route::Route;

/// An `INFO` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Server,
    Clients,
    Memory,
    Persistence,
    Stats,
    Replication,
    Cpu,
    Commandstats,
    Latencystats,
    Sentinel,
    Cluster,
    Modules,
    Keyspace,
    Errorstats,
    All,
    Default,
    Everything,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Server => "server",
            Section::Clients => "clients",
            Section::Memory => "memory",
            Section::Persistence => "persistence",
            Section::Stats => "stats",
            Section::Replication => "replication",
            Section::Cpu => "cpu",
            Section::Commandstats => "commandstats",
            Section::Latencystats => "latencystats",
            Section::Sentinel => "sentinel",
            Section::Cluster => "cluster",
            Section::Modules => "modules",
            Section::Keyspace => "keyspace",
            Section::Errorstats => "errorstats",
            Section::All => "all",
            Section::Default => "default",
            Section::Everything => "everything",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sections requested from `INFO`. No sections means the server default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoOptions {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl InfoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sections(mut self, sections: impl IntoIterator<Item = Section>) -> Self {
        self.sections = sections.into_iter().collect();
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Optional explicit route carried by cluster options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOption {
    #[serde(default)]
    pub route: Option<Route>,
}

impl RouteOption {
    pub fn new(route: Route) -> Self {
        Self { route: Some(route) }
    }
}

impl From<Route> for RouteOption {
    fn from(route: Route) -> Self {
        RouteOption::new(route)
    }
}

/// `INFO` options with an optional route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfoOptions {
    #[serde(default)]
    pub info_options: InfoOptions,
    #[serde(default, flatten)]
    pub route_option: RouteOption,
}

impl ClusterInfoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info_options(mut self, info_options: InfoOptions) -> Self {
        self.info_options = info_options;
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route_option = RouteOption::new(route);
        self
    }

    pub fn route(&self) -> Option<&Route> {
        self.route_option.route.as_ref()
    }
}

/// `PING` options. Without a message the server answers `PONG`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingOptions {
    #[serde(default)]
    pub message: Option<String>,
}

impl PingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        self.message.iter().cloned().collect()
    }
}

/// `PING` options with an optional route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPingOptions {
    #[serde(default)]
    pub ping_options: PingOptions,
    #[serde(default, flatten)]
    pub route_option: RouteOption,
}

impl ClusterPingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.ping_options = self.ping_options.with_message(message);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route_option = RouteOption::new(route);
        self
    }

    pub fn route(&self) -> Option<&Route> {
        self.route_option.route.as_ref()
    }
}

/// Keys and arguments for a script invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOptions {
    pub keys: Vec<String>,
    pub args: Vec<String>,
}

impl ScriptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Arguments for a keyless script invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptArgOptions {
    pub args: Vec<String>,
}

impl ScriptArgOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Keyless script invocation with an optional route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterScriptOptions {
    pub script_arg_options: ScriptArgOptions,
    pub route_option: RouteOption,
}

impl ClusterScriptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script_arg_options(mut self, options: ScriptArgOptions) -> Self {
        self.script_arg_options = options;
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route_option = RouteOption::new(route);
        self
    }

    pub fn route(&self) -> Option<&Route> {
        self.route_option.route.as_ref()
    }
}

/// How `SCRIPT FLUSH` empties the script cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlushMode {
    Sync,
    Async,
}

impl FlushMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushMode::Sync => "SYNC",
            FlushMode::Async => "ASYNC",
        }
    }
}

/// `SCRIPT FLUSH` options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFlushOptions {
    #[serde(default)]
    pub mode: Option<FlushMode>,
    #[serde(default, flatten)]
    pub route_option: RouteOption,
}

impl ScriptFlushOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: FlushMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route_option = RouteOption::new(route);
        self
    }

    pub fn route(&self) -> Option<&Route> {
        self.route_option.route.as_ref()
    }

    pub fn to_args(&self) -> Vec<String> {
        self.mode.iter().map(|m| m.as_str().to_string()).collect()
    }
}

/// Key type filter for `SCAN ... TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::String => "string",
            ObjectType::List => "list",
            ObjectType::Set => "set",
            ObjectType::ZSet => "zset",
            ObjectType::Hash => "hash",
            ObjectType::Stream => "stream",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for a cluster-wide `SCAN`. Unset fields use the server default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    #[serde(default)]
    pub match_pattern: Option<String>,
    /// Per-node page size hint.
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub object_type: Option<ObjectType>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    /// Arguments following `SCAN <cursor>`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref pattern) = self.match_pattern {
            args.push("MATCH".to_string());
            args.push(pattern.clone());
        }
        if let Some(count) = self.count {
            args.push("COUNT".to_string());
            args.push(count.to_string());
        }
        if let Some(object_type) = self.object_type {
            args.push("TYPE".to_string());
            args.push(object_type.as_str().to_string());
        }
        args
    }
}
