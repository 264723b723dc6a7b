//! Cluster topology as reported by `CLUSTER NODES`.
//!
//! The engine uses this to expand `AllNodes` routes and to find replicas for
//! replica-targeted slot routes. Primaries for everything else come from the
//! protocol client's own cached routing table.

use thiserror::Error;
use tracing::debug;

use crate::route::NodeAddress;

/// Errors that can occur when parsing cluster topology.
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid cluster nodes format: {0}")]
    InvalidClusterNodes(String),
    #[error("Invalid slot range: {0}")]
    InvalidSlotRange(String),
    /// The node is flagged `noaddr` and reports no usable address.
    #[error("Node {0} has no address")]
    NoAddress(String),
}

/// Role of a cluster node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Primary,
    Replica,
}

/// Flags indicating the state of a cluster node.
#[derive(Debug, Clone, Default)]
pub struct NodeFlags {
    pub myself: bool,
    pub master: bool,
    pub slave: bool,
    /// Potentially failed.
    pub pfail: bool,
    pub fail: bool,
    pub handshake: bool,
    pub noaddr: bool,
}

impl NodeFlags {
    /// Parse flags from the CLUSTER NODES output.
    pub fn parse(flags_str: &str) -> Self {
        let mut flags = NodeFlags::default();
        for flag in flags_str.split(',') {
            match flag.trim() {
                "myself" => flags.myself = true,
                "master" => flags.master = true,
                "slave" => flags.slave = true,
                "pfail" | "fail?" => flags.pfail = true,
                "fail" => flags.fail = true,
                "handshake" => flags.handshake = true,
                "noaddr" => flags.noaddr = true,
                _ => {}
            }
        }
        flags
    }

    pub fn role(&self) -> NodeRole {
        if self.master {
            NodeRole::Primary
        } else {
            NodeRole::Replica
        }
    }

    /// Not failed, not handshaking, and addressable.
    pub fn is_healthy(&self) -> bool {
        !self.fail && !self.pfail && !self.handshake && !self.noaddr
    }
}

/// An inclusive hash slot range owned by a primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: u16,
    pub end: u16,
}

impl SlotRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, slot: u16) -> bool {
        (self.start..=self.end).contains(&slot)
    }

    /// Parse `"0-5460"` or `"5461"`. Migration markers (`[...]`) are rejected.
    pub fn parse(s: &str) -> Result<Self, TopologyError> {
        let s = s.trim();
        if s.starts_with('[') {
            return Err(TopologyError::InvalidSlotRange(format!(
                "Slot in migration: {}",
                s
            )));
        }

        let parse_slot = |v: &str| {
            v.parse::<u16>()
                .map_err(|_| TopologyError::InvalidSlotRange(format!("Invalid slot: {}", v)))
        };

        match s.split_once('-') {
            Some((start, end)) => Ok(SlotRange::new(parse_slot(start)?, parse_slot(end)?)),
            None => {
                let slot = parse_slot(s)?;
                Ok(SlotRange::new(slot, slot))
            }
        }
    }
}

/// A cluster node as reported by `CLUSTER NODES`.
#[derive(Debug, Clone)]
pub struct ClusterNode {
    pub node_id: String,
    pub address: NodeAddress,
    pub flags: NodeFlags,
    /// Primary node ID when this node is a replica.
    pub primary_id: Option<String>,
    /// `connected` or `disconnected`.
    pub link_state: String,
    pub slots: Vec<SlotRange>,
}

impl ClusterNode {
    pub fn role(&self) -> NodeRole {
        self.flags.role()
    }

    pub fn is_primary(&self) -> bool {
        self.flags.master
    }

    pub fn is_replica(&self) -> bool {
        self.flags.slave
    }

    pub fn is_connected(&self) -> bool {
        self.link_state == "connected"
    }

    pub fn is_healthy(&self) -> bool {
        self.flags.is_healthy() && self.is_connected()
    }

    pub fn owns_slot(&self, slot: u16) -> bool {
        self.slots.iter().any(|r| r.contains(slot))
    }

    /// Parse a single line from `CLUSTER NODES` output.
    ///
    /// Line format: `<id> <ip:port@cport[,hostname]> <flags> <primary> <ping-sent>
    /// <pong-recv> <config-epoch> <link-state> <slot> ...`
    pub fn parse_line(line: &str) -> Result<Self, TopologyError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [node_id, addr, flags, primary, _ping, _pong, _epoch, link_state, slots @ ..] =
            parts.as_slice()
        else {
            return Err(TopologyError::InvalidClusterNodes(format!(
                "Not enough fields in line: {}",
                line
            )));
        };

        let flags = NodeFlags::parse(flags);
        let ip_port = addr.split('@').next().unwrap_or(addr);
        let address: NodeAddress = match ip_port.parse() {
            Ok(address) => address,
            Err(_) if flags.noaddr => {
                return Err(TopologyError::NoAddress((*node_id).to_string()));
            }
            Err(_) => {
                return Err(TopologyError::InvalidClusterNodes(format!(
                    "Invalid address format: {}",
                    ip_port
                )));
            }
        };

        let primary_id = if *primary == "-" {
            None
        } else {
            Some((*primary).to_string())
        };

        Ok(ClusterNode {
            node_id: (*node_id).to_string(),
            address,
            flags,
            primary_id,
            link_state: (*link_state).to_string(),
            slots: slots
                .iter()
                .filter_map(|s| SlotRange::parse(s).ok())
                .collect(),
        })
    }
}

/// Parsed output of `CLUSTER NODES` command.
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    pub nodes: Vec<ClusterNode>,
}

impl ClusterTopology {
    /// Parse the output of `CLUSTER NODES` command.
    ///
    /// Nodes without an address (`noaddr`, printed as `:0@0`) cannot be
    /// reached and are left out.
    pub fn parse(output: &str) -> Result<Self, TopologyError> {
        let mut nodes = Vec::new();
        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            match ClusterNode::parse_line(line) {
                Ok(node) => nodes.push(node),
                Err(TopologyError::NoAddress(node_id)) => {
                    debug!(%node_id, "Skipping cluster node without an address");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ClusterTopology { nodes })
    }

    pub fn primaries(&self) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.is_primary()).collect()
    }

    pub fn replicas(&self) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.is_replica()).collect()
    }

    pub fn replicas_of(&self, primary_id: &str) -> Vec<&ClusterNode> {
        self.nodes
            .iter()
            .filter(|n| n.primary_id.as_deref() == Some(primary_id))
            .collect()
    }

    pub fn healthy_nodes(&self) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.is_healthy()).collect()
    }

    /// The primary currently serving `slot`.
    pub fn primary_for_slot(&self, slot: u16) -> Option<&ClusterNode> {
        self.nodes
            .iter()
            .find(|n| n.is_primary() && n.owns_slot(slot))
    }

    /// A healthy replica of the primary serving `slot`.
    pub fn replica_for_slot(&self, slot: u16) -> Option<&ClusterNode> {
        let primary = self.primary_for_slot(slot)?;
        self.replicas_of(&primary.node_id)
            .into_iter()
            .find(|n| n.is_healthy())
    }
}
