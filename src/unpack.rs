//! Envelope routing and unpacking into per-recipient messages.
//!
//! The raw envelope stream produced by the messaging phase is first routed to
//! its destination channels, then each channel unpacks its envelopes into
//! `(recipient, payload)` pairs:
//!
//! - **explicit-list** envelopes flat-map over their recipient header;
//! - **broadcast** envelopes look the sender up in the channel's local
//!   out-neighbour map and emit one pair per reconstructed neighbour.
//!
//! The two unpacked streams are unioned into the message stream the update
//! host consumes. Unpacking is stateless and order-independent apart from the
//! read-only edge index.

use crate::edge_index::EdgeIndex;
use crate::envelope::Envelope;
use crate::graph::{Data, VertexKey};

/// Route envelopes to their destination channels.
pub(crate) fn route_by_channel<K, M>(
    envelopes: Vec<Envelope<K, M>>,
    channels: usize,
) -> Vec<Vec<Envelope<K, M>>> {
    let mut routed: Vec<Vec<Envelope<K, M>>> = Vec::with_capacity(channels);
    routed.resize_with(channels, Vec::new);
    for envelope in envelopes {
        routed[envelope.channel].push(envelope);
    }
    routed
}

/// Unpack one channel's envelopes into the union message stream.
pub(crate) fn unpack_channel<K: VertexKey, M: Data, E: Data>(
    channel: usize,
    envelopes: Vec<Envelope<K, M>>,
    index: &EdgeIndex<K, E>,
) -> Vec<(K, M)> {
    let mut out = Vec::new();
    for envelope in envelopes {
        if envelope.is_broadcast() {
            if let Some(targets) = index.local_targets(channel, &envelope.sender) {
                for target in targets {
                    out.push((target.clone(), envelope.payload.clone()));
                }
            }
        } else {
            let Envelope {
                payload,
                mut recipients,
                ..
            } = envelope;
            let last = recipients
                .pop()
                .expect("explicit-list envelopes are non-empty");
            for recipient in recipients {
                out.push((recipient, payload.clone()));
            }
            out.push((last, payload));
        }
    }
    out
}
