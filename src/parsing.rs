//! Parsing helpers for `INFO` text.
//!
//! `INFO` replies are `key:value` lines grouped under `# Section` headers.
//! Combine with [`ClusterValue::try_map`](crate::ClusterValue::try_map) to
//! parse every node's reply at once.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to compile regex: {0}")]
    RegexCompilation(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

static KV_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([\w-]+):(.*)$"));

/// Parse key-value pairs from INFO output.
///
/// Blank lines and section headers are skipped. Values keep everything after
/// the first colon, so `executable:/usr/bin/valkey-server` survives intact.
///
/// # Example
/// ```
/// use valkey_cluster_client::parsing::parse_info_output;
///
/// let info = "# Replication\nrole:master\nconnected_slaves:1\n";
/// let parsed = parse_info_output(info).unwrap();
/// assert_eq!(parsed.get("role"), Some(&"master".to_string()));
/// ```
pub fn parse_info_output(info: &str) -> Result<HashMap<String, String>, ParseError> {
    let kv_regex = KV_REGEX
        .as_ref()
        .map_err(|e| ParseError::RegexCompilation(e.to_string()))?;

    let mut result = HashMap::new();
    for line in info.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = kv_regex.captures(line)
            && let (Some(key), Some(value)) = (caps.get(1), caps.get(2))
        {
            result.insert(key.as_str().to_string(), value.as_str().to_string());
        }
    }

    Ok(result)
}

/// Parse a specific value from INFO output by key name.
pub fn parse_info_value(info: &str, key: &str) -> Option<String> {
    parse_info_output(info)
        .ok()
        .and_then(|map| map.get(key).cloned())
}

/// Parse an integer value from INFO output.
pub fn parse_info_int(info: &str, key: &str) -> Option<i64> {
    parse_info_value(info, key).and_then(|v| v.trim().parse().ok())
}

/// Role and replication offset of one node, from `INFO replication`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationInfo {
    /// `master` or `slave`
    pub role: String,
    pub connected_replicas: Option<i64>,
    pub master_repl_offset: Option<i64>,
}

impl ReplicationInfo {
    pub fn parse(info: &str) -> Result<Self, ParseError> {
        let parsed = parse_info_output(info)?;
        let role = parsed
            .get("role")
            .cloned()
            .ok_or_else(|| ParseError::MissingField("role".to_string()))?;

        let int_field = |field: &str| -> Result<Option<i64>, ParseError> {
            parsed
                .get(field)
                .map(|v| {
                    v.trim().parse().map_err(|_| ParseError::InvalidValue {
                        field: field.to_string(),
                        value: v.clone(),
                    })
                })
                .transpose()
        };

        Ok(ReplicationInfo {
            role,
            connected_replicas: int_field("connected_slaves")?,
            master_repl_offset: int_field("master_repl_offset")?,
        })
    }

    pub fn is_primary(&self) -> bool {
        self.role == "master"
    }
}
