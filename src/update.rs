//! The vertex-update host: the user update UDF and its context.
//!
//! The update phase co-groups the unpacked message stream with the solution
//! set by vertex id. For every vertex that received messages the driver
//! invokes [`VertexUpdateFunction::update_vertex`]; returning `Some(state)`
//! replaces the vertex's state and places it in the next work set, returning
//! `None` leaves the vertex unchanged and inactive. A message addressed to a
//! vertex id absent from the solution set fails the job.

use crate::aggregators::{AggregateSnapshot, AggregatorBag};
use crate::broadcast::BroadcastSets;
use crate::graph::{Data, VertexKey};
use crate::superstep::SuperstepContext;
use anyhow::Result;
use std::any::Any;
use std::sync::Arc;

/// The user update UDF, invoked for every vertex that received messages.
pub trait VertexUpdateFunction<K: VertexKey, V: Data, M: Data>: Send + Sync {
    /// Compute the vertex's next state from its current state and the
    /// messages delivered this superstep. Return `Some` to update the vertex
    /// (re-activating it for the next superstep), `None` to keep it as is.
    ///
    /// Message order within one superstep is unspecified; implementations
    /// must be order-independent.
    fn update_vertex(
        &self,
        ctx: &mut UpdateContext<'_>,
        key: &K,
        state: &V,
        messages: Messages<'_, M>,
    ) -> Result<Option<V>>;

    /// Called once before the first superstep.
    fn init(&self, _ctx: &SuperstepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once before each superstep's update phase.
    fn pre_superstep(&self, _ctx: &SuperstepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once after each superstep's update phase.
    fn post_superstep(&self, _ctx: &SuperstepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// The messages delivered to one vertex in one superstep.
pub struct Messages<'a, M> {
    inner: std::slice::Iter<'a, M>,
}

impl<'a, M> Messages<'a, M> {
    pub(crate) fn new(messages: &'a [M]) -> Self {
        Self {
            inner: messages.iter(),
        }
    }
}

impl<'a, M> Iterator for Messages<'a, M> {
    type Item = &'a M;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<M> ExactSizeIterator for Messages<'_, M> {}

/// Accessors available to the update UDF while processing one vertex.
pub struct UpdateContext<'a> {
    superstep: usize,
    broadcasts: &'a BroadcastSets,
    previous: &'a AggregateSnapshot,
    aggregators: &'a mut AggregatorBag,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        superstep: usize,
        broadcasts: &'a BroadcastSets,
        previous: &'a AggregateSnapshot,
        aggregators: &'a mut AggregatorBag,
    ) -> Self {
        Self {
            superstep,
            broadcasts,
            previous,
            aggregators,
        }
    }

    /// The current superstep, starting at 1.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Fold `value` into the named aggregator.
    ///
    /// # Errors
    ///
    /// Fails for an unregistered name or a value type the aggregator does
    /// not accept.
    pub fn aggregate<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> Result<()> {
        self.aggregators.aggregate(name, value)
    }

    /// The combined value of the named aggregator from the previous
    /// superstep, or `None` before the first barrier or for an unknown name.
    pub fn previous_aggregate<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.previous.get::<T>(name)
    }

    /// The named broadcast set registered for the update function.
    ///
    /// # Errors
    ///
    /// Fails for an unregistered name or a mismatched element type.
    pub fn broadcast_set<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<Vec<T>>> {
        self.broadcasts.get::<T>(name)
    }
}
