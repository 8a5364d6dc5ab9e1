//! Auxiliary tables over the edge set.
//!
//! The indexer makes one pass over the input edges and derives everything the
//! messaging pipeline needs to route and unpack envelopes:
//!
//! - the **sender-side adjacency**: outgoing edges grouped by source vertex,
//!   handed to the messaging function one vertex at a time;
//! - the **representative table**: for every channel that appears as an edge
//!   destination, the minimum destination key hashed to it -- the stable
//!   routing key for broadcast envelopes;
//! - the **partition-local out-neighbour maps**: per channel, the map from a
//!   sender to the edge targets living in that channel, used by the broadcast
//!   unpacker to reconstruct suppressed recipients.
//!
//! Representatives are derived from edge *destinations* only. A vertex that
//! never appears as a destination lives in no representative's cohort and
//! cannot receive broadcast envelopes -- which is consistent, because no edge
//! points at it, so no broadcast would ever be generated for it.
//!
//! All three tables are immutable for the lifetime of a run; their combined
//! footprint is `O(edges)`.

use crate::graph::{Data, OutEdge, VertexKey};
use crate::partitioner::HashPartitioner;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Immutable edge tables shared by the messaging host and the unpackers.
pub struct EdgeIndex<K, E> {
    by_source: HashMap<K, Arc<Vec<OutEdge<K, E>>>>,
    representatives: HashMap<usize, K>,
    local_targets: Vec<HashMap<K, Vec<K>>>,
}

impl<K: VertexKey, E: Data> EdgeIndex<K, E> {
    /// Build the index from the input edge set.
    ///
    /// Each edge's destination is hashed once through `partitioner`; the
    /// result feeds the representative table and the per-channel adjacency in
    /// the same pass.
    pub fn build(edges: Vec<(K, K, E)>, partitioner: &HashPartitioner) -> Self {
        let mut by_source: HashMap<K, Vec<OutEdge<K, E>>> = HashMap::new();
        let mut representatives: HashMap<usize, K> = HashMap::new();
        let mut local_targets: Vec<HashMap<K, Vec<K>>> =
            vec![HashMap::new(); partitioner.channels()];

        for (src, dst, value) in edges {
            let channel = partitioner.channel_for(&dst);
            match representatives.entry(channel) {
                Entry::Occupied(mut e) => {
                    if dst < *e.get() {
                        e.insert(dst.clone());
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(dst.clone());
                }
            }
            local_targets[channel]
                .entry(src.clone())
                .or_default()
                .push(dst.clone());
            by_source
                .entry(src)
                .or_default()
                .push(OutEdge::new(dst, value));
        }

        Self {
            by_source: by_source
                .into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
            representatives,
            local_targets,
        }
    }

    /// The outgoing edges of `vertex`, or `None` if it has none.
    pub fn outgoing(&self, vertex: &K) -> Option<Arc<Vec<OutEdge<K, E>>>> {
        self.by_source.get(vertex).cloned()
    }

    /// The out-degree of `vertex`.
    pub fn out_degree(&self, vertex: &K) -> usize {
        self.by_source.get(vertex).map_or(0, |edges| edges.len())
    }

    /// The representative table keyed by channel.
    pub fn representatives(&self) -> &HashMap<usize, K> {
        &self.representatives
    }

    /// The representative table as `(channel, representative)` rows, sorted
    /// by channel. This is the payload of the engine's reserved broadcast set.
    pub fn representatives_table(&self) -> Vec<(usize, K)> {
        let mut table: Vec<(usize, K)> = self
            .representatives
            .iter()
            .map(|(channel, key)| (*channel, key.clone()))
            .collect();
        table.sort_by_key(|(channel, _)| *channel);
        table
    }

    /// The edge targets of `sender` that live in `channel`, if any.
    pub fn local_targets(&self, channel: usize, sender: &K) -> Option<&[K]> {
        self.local_targets[channel]
            .get(sender)
            .map(|targets| targets.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(edges: Vec<(i64, i64)>, channels: usize) -> (EdgeIndex<i64, ()>, HashPartitioner) {
        let partitioner = HashPartitioner::new(channels);
        let valued = edges.into_iter().map(|(s, t)| (s, t, ())).collect();
        (EdgeIndex::build(valued, &partitioner), partitioner)
    }

    #[test]
    fn outgoing_edges_are_grouped_by_source() {
        let (idx, _) = index(vec![(1, 2), (1, 3), (2, 3)], 2);
        assert_eq!(idx.out_degree(&1), 2);
        assert_eq!(idx.out_degree(&2), 1);
        assert_eq!(idx.out_degree(&3), 0);
        assert!(idx.outgoing(&3).is_none());
    }

    #[test]
    fn representative_is_minimum_destination_per_channel() {
        let (idx, part) = index(vec![(1, 10), (1, 20), (2, 30), (3, 40)], 4);
        for (channel, repr) in idx.representatives_table() {
            assert_eq!(part.channel_for(&repr), channel);
            for dst in [10i64, 20, 30, 40] {
                if part.channel_for(&dst) == channel {
                    assert!(repr <= dst);
                }
            }
        }
    }

    #[test]
    fn channels_without_destinations_have_no_representative() {
        // With a single destination there is exactly one populated channel.
        let (idx, part) = index(vec![(1, 2)], 8);
        let table = idx.representatives_table();
        assert_eq!(table, vec![(part.channel_for(&2i64), 2)]);
    }

    #[test]
    fn local_targets_contain_only_edges_into_that_channel() {
        let (idx, part) = index(vec![(1, 2), (1, 3), (1, 4), (2, 4)], 3);
        for channel in 0..3 {
            for (sender, dsts) in [(1i64, vec![2i64, 3, 4]), (2, vec![4])] {
                let local: Vec<i64> = dsts
                    .iter()
                    .copied()
                    .filter(|d| part.channel_for(d) == channel)
                    .collect();
                match idx.local_targets(channel, &sender) {
                    Some(ts) => assert_eq!(ts, local.as_slice()),
                    None => assert!(local.is_empty()),
                }
            }
        }
    }

    #[test]
    fn self_loops_are_indexed_like_any_edge() {
        let (idx, part) = index(vec![(5, 5)], 2);
        let ch = part.channel_for(&5i64);
        assert_eq!(idx.local_targets(ch, &5), Some([5i64].as_slice()));
        assert_eq!(idx.out_degree(&5), 1);
    }
}
