//! Content-addressed script storage held by the execution engine.
//!
//! Bodies are keyed by the lowercase SHA-1 hex of their bytes, the same
//! digest `EVALSHA` uses. Identical bodies share one entry and there is no
//! reference count: removing a hash removes it for every holder.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sha1::{Digest, Sha1};

use crate::error::BridgeError;

/// Length of a SHA-1 digest in hex characters.
pub const SCRIPT_HASH_LEN: usize = 40;

/// Compute the cache key of a script body.
pub fn script_hash(code: &[u8]) -> String {
    hex::encode(Sha1::digest(code))
}

/// Shared map from script hash to script body.
#[derive(Debug, Clone, Default)]
pub struct ScriptCache {
    scripts: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body and return its hash. Re-inserting the same bytes is a no-op.
    pub fn add(&self, code: &[u8]) -> String {
        let hash = script_hash(code);
        self.scripts
            .write()
            .entry(hash.clone())
            .or_insert_with(|| Arc::from(code));
        hash
    }

    pub fn get(&self, hash: &str) -> Option<Arc<[u8]>> {
        self.scripts.read().get(hash).cloned()
    }

    /// Remove a body by hash. Unknown but well-formed hashes are ignored.
    pub fn remove(&self, hash: &str) -> Result<(), BridgeError> {
        if hash.len() != SCRIPT_HASH_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BridgeError::Request(format!(
                "invalid script hash: {hash}"
            )));
        }
        self.scripts.write().remove(hash);
        Ok(())
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.scripts.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }
}
