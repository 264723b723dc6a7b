//! Handles over scripts held in the execution engine's script cache.
//!
//! A [`Script`] owns one cache entry by hash. Closing is idempotent per
//! handle, but the cache entry itself is not reference counted: two handles
//! for byte-identical bodies share one entry, and closing either removes it
//! for both.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::bridge::ExecutionBridge;
use crate::error::BridgeError;
use crate::metrics::CommandMetrics;

/// Register a script body. An empty body yields an empty hash without
/// touching the engine.
pub fn store_script(bridge: &dyn ExecutionBridge, code: &[u8]) -> String {
    if code.is_empty() {
        return String::new();
    }
    bridge.store_script(code)
}

/// Remove a script by hash. An empty hash succeeds without touching the
/// engine.
pub fn drop_script(bridge: &dyn ExecutionBridge, hash: &str) -> Result<(), BridgeError> {
    if hash.is_empty() {
        return Ok(());
    }
    bridge.drop_script(hash)
}

/// A script registered in the engine's cache.
///
/// Dropping the handle closes it. Use [`Script::close`] directly to observe
/// a failed removal.
pub struct Script {
    hash: String,
    closed: AtomicBool,
    bridge: Arc<dyn ExecutionBridge>,
    metrics: Option<Arc<CommandMetrics>>,
}

impl Script {
    /// Register `code` with `bridge` and return a handle over it.
    pub fn new(bridge: Arc<dyn ExecutionBridge>, code: impl AsRef<[u8]>) -> Self {
        Self::register(bridge, code.as_ref(), None)
    }

    pub(crate) fn register(
        bridge: Arc<dyn ExecutionBridge>,
        code: &[u8],
        metrics: Option<Arc<CommandMetrics>>,
    ) -> Self {
        let hash = store_script(&*bridge, code);
        debug!(hash = %hash, len = code.len(), "Registered script");
        if let Some(ref m) = metrics {
            m.script_opened();
        }
        Self {
            hash,
            closed: AtomicBool::new(false),
            bridge,
            metrics,
        }
    }

    /// Content hash of the script body. Empty for an empty body.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Remove the script from the engine's cache.
    ///
    /// Only the first call reaches the engine; later calls return `Ok(())`.
    /// The handle counts as closed even when the removal fails.
    pub fn close(&self) -> Result<(), BridgeError> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        if let Some(ref m) = self.metrics {
            m.script_closed();
        }
        debug!(hash = %self.hash, "Dropping script");
        drop_script(&*self.bridge, &self.hash)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("hash", &self.hash)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Script {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(hash = %self.hash, error = %e, "Failed to drop script on release");
        }
    }
}
