//! The wire datum exchanged between the messaging and update phases.
//!
//! An [`Envelope`] is one shipped unit: a payload plus a header describing the
//! sender, the destination channel, and the recipient form. The recipient list
//! doubles as the subtype discriminator:
//!
//! - **empty** -- a broadcast-to-partition envelope; the receiving worker
//!   reconstructs the recipients from its partition-local out-neighbour index.
//! - **non-empty** -- an explicit-list envelope; every listed key belongs to
//!   the envelope's destination channel.
//!
//! Headers are populated entirely by the messaging host at packing time;
//! downstream operators never synthesize them.

use serde::{Deserialize, Serialize};

/// A single message envelope addressed to one destination channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<K, M> {
    /// The message payload, shared by every recipient of this envelope.
    pub payload: M,
    /// The vertex that sent the message.
    pub sender: K,
    /// Explicit recipients. Empty means broadcast-to-partition; the worker
    /// owning `channel` enumerates recipients from its local edge index.
    pub recipients: Vec<K>,
    /// The destination channel (partition index).
    pub channel: usize,
    /// The key this envelope is routed by: an arbitrary member of
    /// `recipients` for explicit-list envelopes, the representative vertex of
    /// the destination partition for broadcasts. Consistent with `channel` by
    /// construction.
    pub route: K,
}

impl<K, M> Envelope<K, M> {
    /// Whether this envelope is a broadcast-to-partition envelope.
    pub fn is_broadcast(&self) -> bool {
        self.recipients.is_empty()
    }
}
