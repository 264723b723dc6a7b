//! Single-or-per-node command results.
//!
//! [`ClusterValue`] is what every route-aware facade call returns. Which
//! variant a call produces follows the cardinality of the route that was
//! used, never the shape of the payload: a single node answering with a
//! map-typed reply is still `Single`.

use std::collections::HashMap;

use crate::bridge::RawResponse;
use crate::error::{ClientError, DecodeError};
use crate::route::Route;
use crate::value::Value;

/// Result of a command that may have been answered by one node or many.
///
/// Per-node maps are keyed by the answering node's `host:port`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterValue<T> {
    Single(T),
    Multi(HashMap<String, T>),
}

impl<T> ClusterValue<T> {
    pub fn is_single(&self) -> bool {
        matches!(self, ClusterValue::Single(_))
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, ClusterValue::Multi(_))
    }

    /// Borrow the single value. Fails with a misuse error on a per-node result.
    pub fn single_value(&self) -> Result<&T, ClientError> {
        match self {
            ClusterValue::Single(value) => Ok(value),
            ClusterValue::Multi(map) => Err(ClientError::Misuse(format!(
                "single_value() called on a multi-node result with {} entries",
                map.len()
            ))),
        }
    }

    /// Borrow the per-node map. Fails with a misuse error on a single result.
    pub fn multi_value(&self) -> Result<&HashMap<String, T>, ClientError> {
        match self {
            ClusterValue::Multi(map) => Ok(map),
            ClusterValue::Single(_) => Err(ClientError::Misuse(
                "multi_value() called on a single-node result".to_string(),
            )),
        }
    }

    pub fn into_single(self) -> Result<T, ClientError> {
        match self {
            ClusterValue::Single(value) => Ok(value),
            ClusterValue::Multi(map) => Err(ClientError::Misuse(format!(
                "into_single() called on a multi-node result with {} entries",
                map.len()
            ))),
        }
    }

    pub fn into_multi(self) -> Result<HashMap<String, T>, ClientError> {
        match self {
            ClusterValue::Multi(map) => Ok(map),
            ClusterValue::Single(_) => Err(ClientError::Misuse(
                "into_multi() called on a single-node result".to_string(),
            )),
        }
    }

    /// Apply `f` to every contained value, keeping the variant.
    pub fn map<U, F>(self, mut f: F) -> ClusterValue<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            ClusterValue::Single(value) => ClusterValue::Single(f(value)),
            ClusterValue::Multi(map) => {
                ClusterValue::Multi(map.into_iter().map(|(node, v)| (node, f(v))).collect())
            }
        }
    }

    /// Like [`ClusterValue::map`] but stops at the first error.
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<ClusterValue<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        match self {
            ClusterValue::Single(value) => Ok(ClusterValue::Single(f(value)?)),
            ClusterValue::Multi(map) => {
                let mut out = HashMap::with_capacity(map.len());
                for (node, v) in map {
                    out.insert(node, f(v)?);
                }
                Ok(ClusterValue::Multi(out))
            }
        }
    }
}

impl ClusterValue<Value> {
    /// Wrap an opaque reply from a custom command or script invocation.
    ///
    /// The engine tags whether it fanned the command out, so the variant
    /// comes from that tag rather than from the value's own type. A fan-out
    /// that the engine collapsed into one value (all-succeeded or aggregated
    /// response policies) stays `Single` even on a multi-node route. A
    /// per-node reply to an explicit single-node route cannot be honest and
    /// is rejected.
    pub(crate) fn classify(raw: RawResponse, route: Option<&Route>) -> Result<Self, DecodeError> {
        match raw {
            RawResponse::Scalar(value) => Ok(ClusterValue::Single(value)),
            RawResponse::PerNode(map) => match route {
                Some(route) if !route.is_multi_node() => {
                    Err(DecodeError::UnexpectedPerNode { nodes: map.len() })
                }
                _ => Ok(ClusterValue::Multi(map)),
            },
        }
    }
}

impl ClusterValue<String> {
    /// Decode a reply whose expected shape is decided by the route.
    ///
    /// No explicit route or a multi-node route must yield a per-node map of
    /// strings; a single-node route must yield one string. Anything else is
    /// a decode error with no fallback.
    pub(crate) fn decode_strings(
        raw: RawResponse,
        route: Option<&Route>,
    ) -> Result<Self, DecodeError> {
        let multi = route.is_none_or(Route::is_multi_node);
        if multi {
            raw.into_string_map().map(ClusterValue::Multi)
        } else {
            raw.into_string().map(ClusterValue::Single)
        }
    }
}
