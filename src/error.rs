//! Error types for the client.
//!
//! Three failure kinds reach callers: the execution engine failed, the
//! engine's reply did not have the shape the route predicted, or the caller
//! used an API incorrectly. Only some engine failures are worth retrying.

use thiserror::Error;

/// Failure reported by the execution engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The server answered with an error reply.
    #[error("Request error: {0}")]
    Request(String),

    /// A transaction was aborted.
    #[error("Exec aborted: {0}")]
    ExecAbort(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The connection dropped while the request was in flight.
    #[error("Disconnected: {0}")]
    Disconnect(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine could not resolve the nodes a route names.
    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Script not found in cache: {0}")]
    ScriptNotFound(String),
}

impl From<fred::error::Error> for BridgeError {
    fn from(err: fred::error::Error) -> Self {
        use fred::error::ErrorKind;

        let details = err.details().to_string();
        match err.kind() {
            ErrorKind::Timeout => BridgeError::Timeout(details),
            ErrorKind::IO | ErrorKind::Canceled => BridgeError::Disconnect(details),
            ErrorKind::Config | ErrorKind::Url => BridgeError::InvalidConfig(details),
            ErrorKind::Tls | ErrorKind::Auth => BridgeError::Connection(details),
            ErrorKind::Cluster | ErrorKind::Routing => BridgeError::Routing(details),
            _ if details.starts_with("EXECABORT") => BridgeError::ExecAbort(details),
            _ => BridgeError::Request(details),
        }
    }
}

/// The engine's reply did not match the shape the call expected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Expected a per-node map, found {found}")]
    ExpectedMap { found: &'static str },

    #[error("Expected a string, found {found}")]
    ExpectedString { found: &'static str },

    #[error("Reply for node {node} is not a string: {found}")]
    NodeValueNotString { node: String, found: &'static str },

    #[error("Reply is not valid UTF-8")]
    InvalidUtf8,

    #[error("Single-node route produced a per-node reply from {nodes} nodes")]
    UnexpectedPerNode { nodes: usize },

    /// A `SCAN` page was not `[cursor, [keys...]]`.
    #[error("Expected a SCAN reply, found {found}")]
    ExpectedScanReply { found: &'static str },
}

/// Error type for client operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Execution error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The caller used the API incorrectly.
    #[error("Misuse: {0}")]
    Misuse(String),
}

impl ClientError {
    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Bridge(e) => {
                matches!(e, BridgeError::Timeout(_) | BridgeError::Disconnect(_))
            }
            ClientError::Decode(_) | ClientError::Misuse(_) => false,
        }
    }

    /// Label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Bridge(_) => "bridge",
            ClientError::Decode(_) => "decode",
            ClientError::Misuse(_) => "misuse",
        }
    }

    pub fn is_misuse(&self) -> bool {
        matches!(self, ClientError::Misuse(_))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
