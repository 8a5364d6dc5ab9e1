//! Hash partitioning of vertex keys onto channels.
//!
//! A *channel* is the index of the partition (equivalently, of the worker)
//! that owns a key. Every component of the engine that needs to know where a
//! key lives -- the edge indexer, the packing logic inside the messaging host,
//! the envelope router, the solution-set layout -- asks the **same**
//! [`HashPartitioner`]. Re-deriving the channel with an ad-hoc hash anywhere
//! else would break the agreement between senders and receivers.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Maps keys to channel indices in `[0, channels)` by hashing.
#[derive(Clone, Copy, Debug)]
pub struct HashPartitioner {
    channels: usize,
}

impl HashPartitioner {
    /// Create a partitioner over `channels` channels.
    ///
    /// `channels` is the configured parallelism and must be at least 1; the
    /// iteration builder validates this before the partitioner is built.
    pub fn new(channels: usize) -> Self {
        debug_assert!(channels >= 1, "partitioner needs at least one channel");
        Self { channels }
    }

    /// The number of channels keys are spread over.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// The channel that owns `key`.
    pub fn channel_for<K: Hash>(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.channels as u64) as usize
    }
}
