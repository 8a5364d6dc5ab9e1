//! Named read-only broadcast sets.
//!
//! A broadcast set is a small auxiliary dataset replicated to every worker
//! and looked up by name from inside a UDF -- the same shape as a side input
//! in a batch dataflow. Sets are registered on the builder separately for the
//! messaging and the update function, are immutable for the whole run, and
//! travel as `Arc`s (no per-worker copies).
//!
//! One name is reserved by the engine: [`HASH_KEYS_BROADCAST_SET`] carries
//! the representative table (`Vec<(usize, K)>` rows of channel and
//! representative vertex) into the messaging function's scope.

use anyhow::{Result, anyhow, bail};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved broadcast-set name under which the engine publishes the
/// representative table to the messaging function. User code must not
/// register a set under this name.
pub const HASH_KEYS_BROADCAST_SET: &str = "HASH_KEYS_BROADCAST_SET";

/// The broadcast sets visible to one UDF side (messaging or update).
#[derive(Clone, Default)]
pub(crate) struct BroadcastSets {
    sets: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl BroadcastSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user set. Rejects the reserved name and duplicates.
    pub fn insert_user(&mut self, name: &str, set: Arc<dyn Any + Send + Sync>) -> Result<()> {
        if name == HASH_KEYS_BROADCAST_SET {
            bail!("broadcast set name '{HASH_KEYS_BROADCAST_SET}' is reserved by the engine");
        }
        if self.sets.insert(name.to_string(), set).is_some() {
            bail!("duplicate broadcast set name '{name}'");
        }
        Ok(())
    }

    /// Publish the engine's representative table under the reserved name.
    pub fn insert_reserved(&mut self, set: Arc<dyn Any + Send + Sync>) {
        self.sets.insert(HASH_KEYS_BROADCAST_SET.to_string(), set);
    }

    /// Look up a set by name, downcasting to its element type.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<Vec<T>>> {
        let raw = self
            .sets
            .get(name)
            .ok_or_else(|| anyhow!("no broadcast set registered under name '{name}'"))?;
        Arc::clone(raw)
            .downcast::<Vec<T>>()
            .map_err(|_| anyhow!("broadcast set '{name}' holds a different element type"))
    }
}
