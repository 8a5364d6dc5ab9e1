//! # Vertexflow
//!
//! A **vertex-centric graph processing engine** for Rust implementing the
//! bulk-synchronous-parallel (Pregel) model on a partitioned, data-parallel
//! runtime -- with a multicast message-batching optimization that ships one
//! envelope per (sender, destination partition) instead of one per recipient.
//!
//! ## Key Features
//!
//! - **Delta iteration** - only vertices whose state changed in the previous
//!   superstep produce messages in the next one
//! - **Two user functions** - a [`MessagingFunction`] that produces messages
//!   and a [`VertexUpdateFunction`] that folds delivered messages into new
//!   vertex states
//! - **Multicast batching** - `send_message_to_multiple_recipients` packs one
//!   explicit-list envelope per destination partition;
//!   `send_message_to_all_neighbours` ships one recipient-free broadcast
//!   envelope per partition and lets the receiver reconstruct the recipients
//!   from its local edge index
//! - **Aggregators** - named per-superstep reductions whose combined result
//!   is readable in the following superstep
//! - **Broadcast sets** - named read-only datasets replicated to every worker
//! - **Parallel supersteps** - partitions are processed concurrently with
//!   Rayon; the superstep barrier is the join of the parallel scope
//! - **Metrics** (feature `metrics`, default on) - superstep, envelope, and
//!   delivery counters exportable as JSON
//!
//! ## Quick Start
//!
//! Single-source shortest paths over weighted edges:
//!
//! ```no_run
//! use anyhow::Result;
//! use vertexflow::*;
//!
//! struct MinDistance;
//! impl VertexUpdateFunction<u32, f64, f64> for MinDistance {
//!     fn update_vertex(
//!         &self,
//!         _ctx: &mut UpdateContext<'_>,
//!         _key: &u32,
//!         state: &f64,
//!         messages: Messages<'_, f64>,
//!     ) -> Result<Option<f64>> {
//!         let best = messages.fold(f64::INFINITY, |a, m| a.min(*m));
//!         Ok((best < *state).then_some(best))
//!     }
//! }
//!
//! struct Relax;
//! impl MessagingFunction<u32, f64, f64, f64> for Relax {
//!     fn send_messages(
//!         &self,
//!         ctx: &mut MessagingContext<'_, u32, f64, f64>,
//!         _key: &u32,
//!         state: &f64,
//!     ) -> Result<()> {
//!         for edge in ctx.outgoing_edges()? {
//!             ctx.send_message_to(edge.target, state + edge.value);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let edges = vec![(0u32, 1u32, 1.0f64), (1, 2, 2.0), (0, 2, 4.0)];
//! let vertices = vec![(0u32, 0.0f64), (1, f64::INFINITY), (2, f64::INFINITY)];
//!
//! let distances = VertexCentricIteration::with_valued_edges(edges, MinDistance, Relax, 10)
//!     .set_input(vertices)
//!     .create_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Supersteps
//!
//! Execution proceeds in globally synchronous supersteps. Within superstep
//! `i`, the messaging function runs for every vertex in the work set and the
//! update function consumes the delivered messages; no worker starts
//! superstep `i + 1` before all partitions have finished `i` and aggregators
//! have been combined. Messages never cross more than one barrier.
//!
//! ### Work set and solution set
//!
//! The solution set holds exactly one state per vertex at all times. The work
//! set holds the vertices updated in the previous superstep -- initially, all
//! of them. The job terminates when the work set is empty or the configured
//! superstep bound is reached.
//!
//! ### Envelopes
//!
//! A logical "send m to r" never travels alone. The messaging host groups
//! recipients by the partition that owns them and ships one [`Envelope`] per
//! (sender, partition). Broadcast envelopes go further and carry no recipient
//! list at all: the receiving partition already stores every edge pointing
//! into it, so it re-derives the recipients from the sender alone.
//!
//! ### Channels and representatives
//!
//! A *channel* is a partition index assigned to each key by the engine's
//! [`HashPartitioner`]. Each channel that appears as an edge destination has
//! a *representative*: the minimum destination key hashed to it, used as the
//! stable routing key for broadcast envelopes. The representative table is
//! also visible to messaging functions as the reserved broadcast set
//! [`HASH_KEYS_BROADCAST_SET`].
//!
//! ## Module Overview
//!
//! - [`graph`] - trait bounds and the [`OutEdge`] type
//! - [`partitioner`] - the channel-from-key function
//! - [`edge_index`] - representative table and adjacency indexes
//! - [`envelope`] - the wire datum
//! - [`messaging`] - the messaging UDF host and packing
//! - [`update`] - the update UDF host
//! - [`aggregators`] - per-superstep reductions
//! - [`iteration`] - the builder and BSP driver
//! - [`superstep`] - lifecycle-hook context
//! - [`metrics`] - counters and reporting (feature `metrics`)
//! - [`testing`] - assertions, graph builders, and fixtures for tests

pub mod aggregators;
pub mod broadcast;
pub mod edge_index;
pub mod envelope;
pub mod graph;
pub mod iteration;
pub mod messaging;
pub mod partitioner;
pub mod superstep;
pub mod testing;
pub mod update;

mod solution;
mod unpack;

#[cfg(feature = "metrics")]
pub mod metrics;

// General re-exports
pub use aggregators::{
    Aggregator, DoubleSumAggregator, LongMaxAggregator, LongMinAggregator, LongSumAggregator,
};
pub use broadcast::HASH_KEYS_BROADCAST_SET;
pub use edge_index::EdgeIndex;
pub use envelope::Envelope;
pub use graph::{Data, OutEdge, VertexKey};
pub use iteration::VertexCentricIteration;
pub use messaging::{MessagingContext, MessagingFunction, OutgoingEdges};
pub use partitioner::HashPartitioner;
pub use superstep::SuperstepContext;
pub use update::{Messages, UpdateContext, VertexUpdateFunction};
