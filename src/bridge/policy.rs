//! Per-command routing defaults and fan-out response policies.
//!
//! These tables are the engine's business. The facade never reads them; it
//! only sees the [`RawResponse`] shape they produce.

use std::collections::HashMap;

use crate::bridge::RawResponse;
use crate::error::BridgeError;
use crate::value::Value;

/// Where a command goes when the caller gives no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRouting {
    AllPrimaries,
    AllNodes,
    /// The node owning the hash slot of the first argument after the name.
    FirstArgSlot,
    Random,
}

/// How per-node replies of a fan-out are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Keep one entry per node.
    PerNode,
    /// Every node must succeed; any one reply stands for all.
    AllSucceeded,
    /// Integer replies are summed.
    AggregateSum,
}

/// Commands whose second token is a subcommand that decides routing.
const CONTAINER_COMMANDS: &[&str] = &[
    "ACL", "CLIENT", "CLUSTER", "COMMAND", "CONFIG", "FUNCTION", "LATENCY", "MEMORY", "MODULE",
    "OBJECT", "SCRIPT", "SLOWLOG", "XGROUP", "XINFO",
];

/// Normalized command name, e.g. `"CONFIG SET"` or `"GET"`.
pub fn command_name(command_line: &[String]) -> Option<String> {
    let (first, rest) = command_line.split_first()?;
    let first = first.to_ascii_uppercase();
    if CONTAINER_COMMANDS.contains(&first.as_str())
        && let Some(sub) = rest.first()
    {
        return Some(format!("{} {}", first, sub.to_ascii_uppercase()));
    }
    Some(first)
}

/// Default routing for a full command line (name first).
pub fn default_routing(command_line: &[String]) -> DefaultRouting {
    let Some(name) = command_name(command_line) else {
        return DefaultRouting::Random;
    };
    match name.as_str() {
        "CONFIG SET" | "CONFIG RESETSTAT" | "CONFIG REWRITE" | "CLIENT SETNAME" => {
            DefaultRouting::AllNodes
        }
        "INFO" | "PING" | "DBSIZE" | "FLUSHALL" | "FLUSHDB" | "KEYS" | "SCRIPT FLUSH"
        | "SCRIPT KILL" | "CONFIG GET" | "CLIENT LIST" => DefaultRouting::AllPrimaries,
        _ if name.starts_with("CLUSTER ") => DefaultRouting::Random,
        _ if command_line.len() > 1 => DefaultRouting::FirstArgSlot,
        _ => DefaultRouting::Random,
    }
}

/// Fan-out response policy for a full command line (name first).
pub fn response_policy(command_line: &[String]) -> ResponsePolicy {
    match command_name(command_line).as_deref() {
        Some(
            "PING" | "FLUSHALL" | "FLUSHDB" | "SCRIPT FLUSH" | "SCRIPT KILL" | "CONFIG SET"
            | "CONFIG RESETSTAT" | "CONFIG REWRITE" | "CLIENT SETNAME",
        ) => ResponsePolicy::AllSucceeded,
        Some("DBSIZE") => ResponsePolicy::AggregateSum,
        _ => ResponsePolicy::PerNode,
    }
}

impl ResponsePolicy {
    /// Fold the replies of a fully successful fan-out.
    pub fn apply(self, replies: HashMap<String, Value>) -> Result<RawResponse, BridgeError> {
        match self {
            ResponsePolicy::PerNode => Ok(RawResponse::PerNode(replies)),
            ResponsePolicy::AllSucceeded => Ok(RawResponse::Scalar(
                replies.into_values().next().unwrap_or(Value::Nil),
            )),
            ResponsePolicy::AggregateSum => {
                let mut total: i64 = 0;
                for (node, value) in replies {
                    let n = value.as_int().ok_or_else(|| {
                        BridgeError::Request(format!(
                            "cannot aggregate {} reply from {}",
                            value.kind(),
                            node
                        ))
                    })?;
                    total = total.saturating_add(n);
                }
                Ok(RawResponse::Scalar(Value::Int(total)))
            }
        }
    }
}
