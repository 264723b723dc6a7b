//! Cursor state for scanning keys across every primary.
//!
//! A cluster scan walks the primaries one at a time in address order and
//! runs `SCAN` on each until its node-local cursor comes back as `0`. The
//! caller owns the cursor between pages; the engine keeps no scan state.

use crate::error::DecodeError;
use crate::route::NodeAddress;
use crate::value::Value;

/// Node-local cursor that starts and ends a `SCAN` iteration.
const NODE_CURSOR_START: &str = "0";

/// Position of a cluster-wide scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterScanCursor {
    state: ScanState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum ScanState {
    /// Primaries not resolved yet.
    #[default]
    Initial,
    Scanning {
        nodes: Vec<NodeAddress>,
        index: usize,
        cursor: String,
    },
    Finished,
}

impl ClusterScanCursor {
    /// A cursor positioned before the first key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every primary has been scanned to the end.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ScanState::Finished)
    }

    /// The primary the next page is read from.
    pub fn current_node(&self) -> Option<&NodeAddress> {
        match &self.state {
            ScanState::Scanning { nodes, index, .. } => nodes.get(*index),
            ScanState::Initial | ScanState::Finished => None,
        }
    }

    pub(crate) fn is_initial(&self) -> bool {
        matches!(self.state, ScanState::Initial)
    }

    /// Begin scanning `nodes` in the given order.
    pub(crate) fn start(nodes: Vec<NodeAddress>) -> Self {
        let state = if nodes.is_empty() {
            ScanState::Finished
        } else {
            ScanState::Scanning {
                nodes,
                index: 0,
                cursor: NODE_CURSOR_START.to_string(),
            }
        };
        Self { state }
    }

    /// Node and node-local cursor for the next `SCAN`.
    pub(crate) fn next_request(&self) -> Option<(NodeAddress, String)> {
        match &self.state {
            ScanState::Scanning {
                nodes,
                index,
                cursor,
            } => nodes.get(*index).map(|node| (node.clone(), cursor.clone())),
            ScanState::Initial | ScanState::Finished => None,
        }
    }

    /// Position after the current node answered with `node_cursor`.
    pub(crate) fn advance(self, node_cursor: String) -> Self {
        let ScanState::Scanning { nodes, index, .. } = self.state else {
            return self;
        };
        if node_cursor != NODE_CURSOR_START {
            return Self {
                state: ScanState::Scanning {
                    nodes,
                    index,
                    cursor: node_cursor,
                },
            };
        }

        let next = index + 1;
        let state = if next < nodes.len() {
            ScanState::Scanning {
                nodes,
                index: next,
                cursor: NODE_CURSOR_START.to_string(),
            }
        } else {
            ScanState::Finished
        };
        Self { state }
    }
}

/// Split a `SCAN` reply into the next node cursor and the page of keys.
pub(crate) fn parse_scan_reply(value: Value) -> Result<(String, Vec<Value>), DecodeError> {
    let found = value.kind();
    let Value::Array(items) = value else {
        return Err(DecodeError::ExpectedScanReply { found });
    };
    let [cursor, keys]: [Value; 2] = items
        .try_into()
        .map_err(|_| DecodeError::ExpectedScanReply { found })?;

    let cursor = match cursor {
        Value::Int(n) => n.to_string(),
        other => other
            .as_str()
            .map(str::to_string)
            .ok_or(DecodeError::ExpectedScanReply {
                found: other.kind(),
            })?,
    };
    let Value::Array(keys) = keys else {
        return Err(DecodeError::ExpectedScanReply { found: keys.kind() });
    };
    Ok((cursor, keys))
}
