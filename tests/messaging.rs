//! End-to-end behaviour of the messaging pipeline: multicast packing,
//! broadcast dedup, self-loops, and the exclusive edge APIs.

use anyhow::Result;
use vertexflow::testing::*;
use vertexflow::*;

/// Sends one `"x"` from vertex 0 to a fixed recipient set in superstep 1.
struct MulticastOnce {
    recipients: Vec<i64>,
}

impl MessagingFunction<i64, u32, String, ()> for MulticastOnce {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, String, ()>,
        key: &i64,
        _state: &u32,
    ) -> Result<()> {
        if *key == 0 && ctx.superstep() == 1 {
            ctx.send_message_to_multiple_recipients(self.recipients.clone(), "x".to_string());
        }
        Ok(())
    }
}

/// Counts the messages each vertex receives.
struct CountMessages;

impl VertexUpdateFunction<i64, u32, String> for CountMessages {
    fn update_vertex(
        &self,
        _ctx: &mut UpdateContext<'_>,
        _key: &i64,
        state: &u32,
        messages: Messages<'_, String>,
    ) -> Result<Option<u32>> {
        Ok(Some(state + messages.len() as u32))
    }
}

#[test]
fn test_multicast_delivers_one_message_per_recipient() {
    let vertices: Vec<(i64, u32)> = (0..10).map(|k| (k, 0)).collect();
    let recipients = vec![3i64, 7, 9];
    let result = VertexCentricIteration::with_plain_edges(
        vec![],
        CountMessages,
        MulticastOnce {
            recipients: recipients.clone(),
        },
        5,
    )
    .set_parallelism(2)
    .run(vertices)
    .unwrap();

    let expected: Vec<(i64, u32)> = (0..10)
        .map(|k| (k, u32::from(recipients.contains(&k))))
        .collect();
    assert_kv_collections_equal(result, expected);
}

#[cfg(feature = "metrics")]
#[test]
fn test_multicast_ships_one_envelope_per_destination_partition() {
    use std::collections::HashSet;
    use vertexflow::metrics::{EXPLICIT_ENVELOPES, MESSAGES_DELIVERED, MetricsCollector};

    let vertices: Vec<(i64, u32)> = (0..10).map(|k| (k, 0)).collect();
    let recipients = vec![3i64, 7, 9];
    let collector = MetricsCollector::new();
    VertexCentricIteration::with_plain_edges(
        vec![],
        CountMessages,
        MulticastOnce {
            recipients: recipients.clone(),
        },
        5,
    )
    .set_parallelism(2)
    .set_metrics(collector.clone())
    .run(vertices)
    .unwrap();

    let partitioner = HashPartitioner::new(2);
    let spanned: HashSet<usize> = recipients.iter().map(|r| partitioner.channel_for(r)).collect();

    assert_eq!(
        collector.counter(EXPLICIT_ENVELOPES),
        Some(spanned.len() as u64)
    );
    assert_eq!(collector.counter(MESSAGES_DELIVERED), Some(3));
}

/* ===================== broadcast dedup ===================== */

struct BroadcastOnce;

impl MessagingFunction<i64, u32, String, ()> for BroadcastOnce {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, String, ()>,
        key: &i64,
        _state: &u32,
    ) -> Result<()> {
        if *key == 0 && ctx.superstep() == 1 {
            ctx.send_message_to_all_neighbours("b".to_string())?;
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
#[test]
fn test_broadcast_envelope_count_equals_spanned_partitions() {
    use std::collections::HashSet;
    use vertexflow::metrics::{BROADCAST_ENVELOPES, MESSAGES_DELIVERED, MetricsCollector};

    // A star: vertex 0 points at every other vertex, spreading its
    // out-neighbours over all partitions.
    let targets: Vec<i64> = (1..=8).collect();
    let edges: Vec<(i64, i64)> = targets.iter().map(|t| (0, *t)).collect();
    let vertices: Vec<(i64, u32)> = (0..=8).map(|k| (k, 0)).collect();

    let collector = MetricsCollector::new();
    VertexCentricIteration::with_plain_edges(edges, CountMessages, BroadcastOnce, 5)
        .set_parallelism(4)
        .set_metrics(collector.clone())
        .run(vertices)
        .unwrap();

    let partitioner = HashPartitioner::new(4);
    let spanned: HashSet<usize> = targets.iter().map(|t| partitioner.channel_for(t)).collect();

    // One envelope per spanned partition; one delivered pair per neighbour.
    assert_eq!(
        collector.counter(BROADCAST_ENVELOPES),
        Some(spanned.len() as u64)
    );
    assert_eq!(
        collector.counter(MESSAGES_DELIVERED),
        Some(targets.len() as u64)
    );
}

#[test]
fn test_broadcast_reaches_every_neighbour() {
    let targets: Vec<i64> = (1..=8).collect();
    let edges: Vec<(i64, i64)> = targets.iter().map(|t| (0, *t)).collect();
    let vertices: Vec<(i64, u32)> = (0..=8).map(|k| (k, 0)).collect();

    let result = VertexCentricIteration::with_plain_edges(edges, CountMessages, BroadcastOnce, 5)
        .set_parallelism(4)
        .run(vertices)
        .unwrap();

    let expected: Vec<(i64, u32)> = (0..=8).map(|k| (k, u32::from(k != 0))).collect();
    assert_kv_collections_equal(result, expected);
}

#[test]
fn test_self_loop_delivers_the_own_message() {
    let (vertices, edges) = GraphBuilder::new()
        .add_vertex(0i64, 0u32)
        .add_vertex(1, 0)
        .add_edge(0, 0)
        .add_edge(0, 1)
        .build();

    let result = VertexCentricIteration::with_plain_edges(edges, CountMessages, BroadcastOnce, 5)
        .run(vertices)
        .unwrap();

    // Vertex 0 has a self-loop, so it receives its own broadcast.
    assert_kv_collections_equal(result, vec![(0, 1), (1, 1)]);
}

/* ===================== exclusive edge APIs ===================== */

struct CursorThenBroadcast;

impl MessagingFunction<i64, u32, String, ()> for CursorThenBroadcast {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, String, ()>,
        _key: &i64,
        _state: &u32,
    ) -> Result<()> {
        let _ = ctx.outgoing_edges()?;
        ctx.send_message_to_all_neighbours("x".to_string())
    }
}

#[test]
fn test_mixing_cursor_and_broadcast_fails_the_job() {
    let err = VertexCentricIteration::with_plain_edges(
        vec![(0i64, 1i64)],
        CountMessages,
        CursorThenBroadcast,
        5,
    )
    .run(vec![(0, 0u32), (1, 0)])
    .unwrap_err();

    assert!(
        err.to_string().contains("send_message_to_all_neighbours"),
        "unexpected error: {err}"
    );
}

struct DoubleCursor;

impl MessagingFunction<i64, u32, String, ()> for DoubleCursor {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, String, ()>,
        _key: &i64,
        _state: &u32,
    ) -> Result<()> {
        let _ = ctx.outgoing_edges()?;
        let _ = ctx.outgoing_edges()?;
        Ok(())
    }
}

#[test]
fn test_taking_the_cursor_twice_fails_the_job() {
    let err = VertexCentricIteration::with_plain_edges(
        vec![(0i64, 1i64)],
        CountMessages,
        DoubleCursor,
        5,
    )
    .run(vec![(0, 0u32), (1, 0)])
    .unwrap_err();

    assert!(
        err.to_string().contains("at most once"),
        "unexpected error: {err}"
    );
}
