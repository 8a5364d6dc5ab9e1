//! The messaging-function host: the user-facing send API and the
//! partition-aware packing behind it.
//!
//! For every changed vertex the driver points a [`MessagingContext`] at that
//! vertex and invokes the user's [`MessagingFunction::send_messages`] once.
//! The context packs logical sends into [`Envelope`]s so that one envelope is
//! shipped per (sender, destination channel) rather than per recipient:
//!
//! - [`MessagingContext::send_message_to_multiple_recipients`] groups the
//!   recipient set by channel and emits one **explicit-list** envelope per
//!   channel, carrying that channel's recipients in the header.
//! - [`MessagingContext::send_message_to_all_neighbours`] walks the vertex's
//!   outgoing edges and emits one **broadcast** envelope per distinct
//!   destination channel -- recipients are suppressed entirely, because the
//!   receiving worker reconstructs them from its partition-local
//!   out-neighbour index.
//! - [`MessagingContext::send_message_to`] is the single-recipient case of
//!   the multicast.
//!
//! Within one `send_messages` invocation, [`MessagingContext::outgoing_edges`]
//! and `send_message_to_all_neighbours` are mutually exclusive, and the edge
//! cursor is handed out at most once: both consume the same single-pass edge
//! sequence.

use crate::aggregators::{AggregateSnapshot, AggregatorBag};
use crate::broadcast::BroadcastSets;
use crate::envelope::Envelope;
use crate::graph::{Data, OutEdge, VertexKey};
use crate::partitioner::HashPartitioner;
use crate::superstep::SuperstepContext;
use anyhow::{Result, bail};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// The user messaging UDF, invoked once per changed vertex per superstep.
pub trait MessagingFunction<K: VertexKey, V: Data, M: Data, E: Data>: Send + Sync {
    /// Produce the messages of `key` for this superstep through `ctx`.
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, K, M, E>,
        key: &K,
        state: &V,
    ) -> Result<()>;

    /// Called once before each superstep's messaging phase.
    fn pre_superstep(&self, _ctx: &SuperstepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once after each superstep's update phase.
    fn post_superstep(&self, _ctx: &SuperstepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Tracks how the current vertex's one-shot edge sequence has been consumed.
#[derive(Clone, Copy, PartialEq, Eq)]
enum EdgeUse {
    Untouched,
    Cursor,
    Broadcast,
}

/// The send API and packing state for one partition's messaging phase.
///
/// The driver re-targets one context per local vertex; packed envelopes
/// accumulate across vertices and are drained once per partition.
pub struct MessagingContext<'a, K: VertexKey, M: Data, E: Data> {
    superstep: usize,
    partitioner: &'a HashPartitioner,
    representatives: &'a HashMap<usize, K>,
    broadcasts: &'a BroadcastSets,
    previous: &'a AggregateSnapshot,
    aggregators: &'a mut AggregatorBag,
    current: Option<K>,
    edges: Option<Arc<Vec<OutEdge<K, E>>>>,
    out_degree: Option<usize>,
    edge_use: EdgeUse,
    out: Vec<Envelope<K, M>>,
}

impl<'a, K: VertexKey, M: Data, E: Data> MessagingContext<'a, K, M, E> {
    pub(crate) fn new(
        superstep: usize,
        partitioner: &'a HashPartitioner,
        representatives: &'a HashMap<usize, K>,
        broadcasts: &'a BroadcastSets,
        previous: &'a AggregateSnapshot,
        aggregators: &'a mut AggregatorBag,
    ) -> Self {
        Self {
            superstep,
            partitioner,
            representatives,
            broadcasts,
            previous,
            aggregators,
            current: None,
            edges: None,
            out_degree: None,
            edge_use: EdgeUse::Untouched,
            out: Vec::new(),
        }
    }

    /// Point the context at the next vertex of this partition.
    pub(crate) fn set_vertex(
        &mut self,
        key: K,
        edges: Option<Arc<Vec<OutEdge<K, E>>>>,
        out_degree: Option<usize>,
    ) {
        self.current = Some(key);
        self.edges = edges;
        self.out_degree = out_degree;
        self.edge_use = EdgeUse::Untouched;
    }

    /// Drain the envelopes packed for this partition.
    pub(crate) fn into_envelopes(self) -> Vec<Envelope<K, M>> {
        self.out
    }

    fn sender(&self) -> &K {
        self.current
            .as_ref()
            .expect("send APIs are only reachable from within send_messages")
    }

    /// The current superstep, starting at 1.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// The out-degree of the current vertex, if the degrees option is
    /// enabled on the iteration; `None` otherwise.
    pub fn out_degree(&self) -> Option<usize> {
        self.out_degree
    }

    /// Send `payload` to exactly one recipient.
    pub fn send_message_to(&mut self, target: K, payload: M) {
        self.send_message_to_multiple_recipients(vec![target], payload);
    }

    /// Send `payload` to every vertex in `recipients`.
    ///
    /// Recipients are grouped by destination channel; one explicit-list
    /// envelope is emitted per channel, routed by its first recipient. An
    /// empty recipient set emits nothing.
    pub fn send_message_to_multiple_recipients(&mut self, recipients: Vec<K>, payload: M) {
        let mut by_channel: HashMap<usize, Vec<K>> = HashMap::new();
        for target in recipients {
            by_channel
                .entry(self.partitioner.channel_for(&target))
                .or_default()
                .push(target);
        }
        let sender = self.sender().clone();
        for (channel, channel_recipients) in by_channel {
            let route = channel_recipients[0].clone();
            self.out.push(Envelope {
                payload: payload.clone(),
                sender: sender.clone(),
                recipients: channel_recipients,
                channel,
                route,
            });
        }
    }

    /// Send `payload` to every out-neighbour of the current vertex.
    ///
    /// Emits one broadcast envelope per distinct destination channel spanned
    /// by the vertex's out-edges -- not one per neighbour -- routed by the
    /// channel's representative vertex. The receiving worker re-enumerates
    /// the neighbours from its local edge index.
    ///
    /// # Errors
    ///
    /// Fails if [`Self::outgoing_edges`] was already called in this
    /// `send_messages` invocation, or if this method was already called once.
    pub fn send_message_to_all_neighbours(&mut self, payload: M) -> Result<()> {
        match self.edge_use {
            EdgeUse::Cursor => bail!(
                "outgoing_edges was already handed out in this send_messages call; \
                 send_message_to_all_neighbours is unavailable"
            ),
            EdgeUse::Broadcast => bail!(
                "send_message_to_all_neighbours may be called at most once per send_messages call"
            ),
            EdgeUse::Untouched => self.edge_use = EdgeUse::Broadcast,
        }

        let Some(edges) = self.edges.clone() else {
            return Ok(());
        };
        let sender = self.sender().clone();
        let mut seen = vec![false; self.partitioner.channels()];
        for edge in edges.iter() {
            let channel = self.partitioner.channel_for(&edge.target);
            if seen[channel] {
                continue;
            }
            seen[channel] = true;
            let route = self
                .representatives
                .get(&channel)
                .expect("a channel holding an edge destination has a representative")
                .clone();
            self.out.push(Envelope {
                payload: payload.clone(),
                sender: sender.clone(),
                recipients: Vec::new(),
                channel,
                route,
            });
        }
        Ok(())
    }

    /// The outgoing edges of the current vertex as a single-pass cursor.
    ///
    /// # Errors
    ///
    /// Fails on the second call within one `send_messages` invocation, or if
    /// [`Self::send_message_to_all_neighbours`] already consumed the edges.
    pub fn outgoing_edges(&mut self) -> Result<OutgoingEdges<K, E>> {
        match self.edge_use {
            EdgeUse::Broadcast => bail!(
                "send_message_to_all_neighbours has already consumed the outgoing edges \
                 in this send_messages call"
            ),
            EdgeUse::Cursor => {
                bail!("outgoing_edges may be called at most once per send_messages call")
            }
            EdgeUse::Untouched => self.edge_use = EdgeUse::Cursor,
        }
        Ok(OutgoingEdges {
            edges: self.edges.clone(),
            pos: 0,
        })
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

    /// The named broadcast set registered for the messaging function.
    ///
    /// The engine itself publishes the representative table under
    /// [`HASH_KEYS_BROADCAST_SET`](crate::HASH_KEYS_BROADCAST_SET) as
    /// `Vec<(usize, K)>` rows.
    ///
    /// # Errors
    ///
    /// Fails for an unregistered name or a mismatched element type.
    pub fn broadcast_set<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<Vec<T>>> {
        self.broadcasts.get::<T>(name)
    }
}

/// Single-pass cursor over the current vertex's outgoing edges.
pub struct OutgoingEdges<K, E> {
    edges: Option<Arc<Vec<OutEdge<K, E>>>>,
    pos: usize,
}

impl<K: Clone, E: Clone> Iterator for OutgoingEdges<K, E> {
    type Item = OutEdge<K, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let edges = self.edges.as_ref()?;
        let edge = edges.get(self.pos)?.clone();
        self.pos += 1;
        Some(edge)
    }
}
