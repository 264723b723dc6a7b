//! Routing directives for cluster commands.
//!
//! A [`Route`] tells the execution engine which node(s) must run a command.
//! Topology is never consulted here: whether a route touches more than one
//! node is decided by the variant alone, and [`Route::is_multi_node`] is the
//! only place the rest of the crate asks that question.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Number of hash slots in a Valkey cluster.
pub const SLOT_COUNT: u16 = 16384;

/// Errors raised while building a route from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid node address: {0}")]
    InvalidAddress(String),

    #[error("Slot {0} is out of range (0..{SLOT_COUNT})")]
    SlotOutOfRange(u16),
}

/// Which copy of a slot a single-node route should reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    /// The primary that owns the slot.
    #[default]
    Primary,
    /// A replica of the primary that owns the slot.
    Replica,
}

/// A `host:port` pair identifying one cluster node.
///
/// The `Display` form is also the key format of per-node result maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = RouteError;

    /// Parse `host:port`. The split happens on the last colon so that
    /// bracket-less IPv6 hosts keep their own colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RouteError::InvalidAddress(s.to_string()))?;
        if host.is_empty() {
            return Err(RouteError::InvalidAddress(s.to_string()));
        }
        let port = port
            .parse()
            .map_err(|_| RouteError::InvalidAddress(s.to_string()))?;
        Ok(NodeAddress::new(host, port))
    }
}

/// Targeting intent for a single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Route {
    /// Every node in the cluster, primaries and replicas.
    AllNodes,
    /// Every primary node.
    AllPrimaries,
    /// One node chosen by the engine.
    Random,
    /// The node serving the hash slot of `key`.
    SlotKey {
        key: String,
        #[serde(default)]
        slot_type: SlotType,
    },
    /// The node serving slot `id`.
    ///
    /// `id` must be below [`SLOT_COUNT`]. Deserialization and the engine
    /// both reject larger ids; prefer [`Route::slot_id`] when building one.
    SlotId {
        #[serde(deserialize_with = "deserialize_slot_id")]
        id: u16,
        #[serde(default)]
        slot_type: SlotType,
    },
    /// One node by address.
    ByAddress { host: String, port: u16 },
    /// An explicit group of nodes.
    MultiNode { nodes: Vec<NodeAddress> },
}

impl Route {
    /// Route to the primary owning `key`'s slot.
    pub fn slot_key(key: impl Into<String>) -> Self {
        Route::SlotKey {
            key: key.into(),
            slot_type: SlotType::Primary,
        }
    }

    /// Route to a replica of the primary owning `key`'s slot.
    pub fn replica_slot_key(key: impl Into<String>) -> Self {
        Route::SlotKey {
            key: key.into(),
            slot_type: SlotType::Replica,
        }
    }

    /// Route to the primary owning slot `id`.
    pub fn slot_id(id: u16) -> Result<Self, RouteError> {
        if id >= SLOT_COUNT {
            return Err(RouteError::SlotOutOfRange(id));
        }
        Ok(Route::SlotId {
            id,
            slot_type: SlotType::Primary,
        })
    }

    pub fn by_address(host: impl Into<String>, port: u16) -> Self {
        Route::ByAddress {
            host: host.into(),
            port,
        }
    }

    /// Route to a node given as `host:port`.
    pub fn by_address_str(address: &str) -> Result<Self, RouteError> {
        let addr: NodeAddress = address.parse()?;
        Ok(Route::ByAddress {
            host: addr.host,
            port: addr.port,
        })
    }

    pub fn multi_node(nodes: impl IntoIterator<Item = NodeAddress>) -> Self {
        Route::MultiNode {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Whether executing this route necessarily touches more than one node.
    ///
    /// Depends on the variant only. `Random` is single-node: it reaches exactly
    /// one node even though the engine picks which.
    pub fn is_multi_node(&self) -> bool {
        match self {
            Route::AllNodes | Route::AllPrimaries | Route::MultiNode { .. } => true,
            Route::Random
            | Route::SlotKey { .. }
            | Route::SlotId { .. }
            | Route::ByAddress { .. } => false,
        }
    }
}

fn deserialize_slot_id<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let id = u16::deserialize(deserializer)?;
    if id >= SLOT_COUNT {
        return Err(serde::de::Error::custom(RouteError::SlotOutOfRange(id)));
    }
    Ok(id)
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::AllNodes => write!(f, "all-nodes"),
            Route::AllPrimaries => write!(f, "all-primaries"),
            Route::Random => write!(f, "random"),
            Route::SlotKey { key, slot_type } => write!(f, "slot-key({key}, {slot_type:?})"),
            Route::SlotId { id, slot_type } => write!(f, "slot-id({id}, {slot_type:?})"),
            Route::ByAddress { host, port } => write!(f, "address({host}:{port})"),
            Route::MultiNode { nodes } => write!(f, "multi-node({} nodes)", nodes.len()),
        }
    }
}
