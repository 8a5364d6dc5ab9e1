//! Core data-model types and the blanket trait bounds used across the engine.
//!
//! This module defines:
//!
//! - [`Data`]: the blanket trait bound for every element carried by the engine
//!   (vertex states, messages, edge values).
//! - [`VertexKey`]: the bound for vertex identifiers, which additionally need
//!   hashing (channel assignment), a total order (representative selection),
//!   and `Debug` (error messages naming a vertex).
//! - [`OutEdge`]: one outgoing edge as seen by a messaging function.
//!
//! Vertices are plain `(K, V)` pairs and input edges are `(K, K)` or
//! `(K, K, E)` tuples; the engine does not wrap them in dedicated structs.

use std::fmt::Debug;
use std::hash::Hash;

/// The standard trait bound for values carried through the engine.
///
/// The runtime moves vertex states, messages, and edge values across worker
/// threads and duplicates them when packing envelopes. To keep this simple and
/// predictable, all such types must be:
///
/// - `'static` (no non-'static borrows inside elements),
/// - `Send + Sync` (safe to pass/share across threads),
/// - `Clone` (packing and unpacking duplicate payloads).
///
/// This blanket impl allows any type fitting these constraints to be used.
pub trait Data: 'static + Send + Sync + Clone {}
impl<T> Data for T where T: 'static + Send + Sync + Clone {}

/// The trait bound for vertex identifiers.
///
/// Beyond [`Data`], a key must be:
///
/// - `Eq + Hash` -- the hash partitioner assigns every key to a channel,
/// - `Ord` -- the representative of a partition is its minimum key,
/// - `Debug` -- runtime errors identify the offending vertex.
pub trait VertexKey: Data + Eq + Hash + Ord + Debug {}
impl<T> VertexKey for T where T: Data + Eq + Hash + Ord + Debug {}

/// An outgoing edge yielded by [`MessagingContext::outgoing_edges`].
///
/// For plain `(K, K)` edge input the value type is `()`.
///
/// [`MessagingContext::outgoing_edges`]: crate::MessagingContext::outgoing_edges
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutEdge<K, E> {
    /// The target vertex of the edge.
    pub target: K,
    /// The edge value (`()` for plain edges).
    pub value: E,
}

impl<K, E> OutEdge<K, E> {
    /// Construct an edge from its target and value.
    pub fn new(target: K, value: E) -> Self {
        Self { target, value }
    }
}
