//! Raw engine replies and their strict decoders.

use std::collections::HashMap;

use crate::error::DecodeError;
use crate::value::Value;

/// A reply as the engine hands it back, tagged by whether it fanned out.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// One value: a single node answered, or the engine folded a fan-out.
    Scalar(Value),
    /// One value per answering node, keyed by `host:port`.
    PerNode(HashMap<String, Value>),
}

impl RawResponse {
    /// Short name of the reply shape, used in decode error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawResponse::Scalar(value) => value.kind(),
            RawResponse::PerNode(_) => "per-node map",
        }
    }

    /// Decode a scalar textual reply.
    pub fn into_string(self) -> Result<String, DecodeError> {
        match self {
            RawResponse::Scalar(value) => value_into_string(value),
            RawResponse::PerNode(_) => Err(DecodeError::ExpectedString {
                found: "per-node map",
            }),
        }
    }

    /// Decode a per-node reply whose every value is textual.
    pub fn into_string_map(self) -> Result<HashMap<String, String>, DecodeError> {
        match self {
            RawResponse::PerNode(map) => map
                .into_iter()
                .map(|(node, value)| {
                    let found = value.kind();
                    match value_into_string(value) {
                        Ok(s) => Ok((node, s)),
                        Err(DecodeError::InvalidUtf8) => Err(DecodeError::InvalidUtf8),
                        Err(_) => Err(DecodeError::NodeValueNotString { node, found }),
                    }
                })
                .collect(),
            RawResponse::Scalar(value) => Err(DecodeError::ExpectedMap {
                found: value.kind(),
            }),
        }
    }
}

fn value_into_string(value: Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Okay => Ok("OK".to_string()),
        Value::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8),
        other => Err(DecodeError::ExpectedString {
            found: other.kind(),
        }),
    }
}
