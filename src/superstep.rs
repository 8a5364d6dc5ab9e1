//! The read-only context handed to UDF lifecycle hooks.

use crate::aggregators::AggregateSnapshot;
use crate::broadcast::BroadcastSets;
use anyhow::Result;
use std::any::Any;
use std::sync::Arc;

/// What a `pre_superstep` / `post_superstep` / `init` hook can see: the
/// superstep number, the previous superstep's combined aggregates, and the
/// broadcast sets registered for this UDF side.
pub struct SuperstepContext<'a> {
    pub(crate) superstep: usize,
    pub(crate) iteration_name: &'a str,
    pub(crate) previous: &'a AggregateSnapshot,
    pub(crate) broadcasts: &'a BroadcastSets,
}

impl SuperstepContext<'_> {
    /// The current superstep, starting at 1.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// The configured iteration name.
    pub fn iteration_name(&self) -> &str {
        self.iteration_name
    }

    /// The combined value of the named aggregator from the previous
    /// superstep, or `None` before the first barrier or for an unknown name.
    pub fn previous_aggregate<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.previous.get::<T>(name)
    }

    /// The named broadcast set registered for this UDF.
    ///
    /// # Errors
    ///
    /// Fails if no set was registered under `name` for this side, or the
    /// element type does not match.
    pub fn broadcast_set<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<Vec<T>>> {
        self.broadcasts.get::<T>(name)
    }
}
