//! End-to-end algorithm scenarios: shortest paths, connected components,
//! PageRank.

use anyhow::Result;
use vertexflow::testing::*;
use vertexflow::*;

/* ===================== single-source shortest paths ===================== */

struct MinDistance;

impl VertexUpdateFunction<char, f64, f64> for MinDistance {
    fn update_vertex(
        &self,
        _ctx: &mut UpdateContext<'_>,
        _key: &char,
        state: &f64,
        messages: Messages<'_, f64>,
    ) -> Result<Option<f64>> {
        let best = messages.fold(f64::INFINITY, |acc, m| acc.min(*m));
        Ok((best < *state).then_some(best))
    }
}

struct Relax;

impl MessagingFunction<char, f64, f64, f64> for Relax {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, char, f64, f64>,
        _key: &char,
        state: &f64,
    ) -> Result<()> {
        if state.is_finite() {
            for edge in ctx.outgoing_edges()? {
                ctx.send_message_to(edge.target, state + edge.value);
            }
        }
        Ok(())
    }
}

#[test]
fn test_single_source_shortest_paths() {
    let (vertices, edges) = sssp_diamond();
    let result = VertexCentricIteration::with_valued_edges(edges, MinDistance, Relax, 10)
        .set_name("sssp")
        .run(vertices)
        .unwrap();

    assert_kv_collections_equal(
        result,
        vec![('A', 0.0), ('B', 1.0), ('C', 3.0), ('D', 4.0)],
    );
}

#[test]
fn test_shortest_paths_are_deterministic_across_runs() {
    let run = || {
        let (vertices, edges) = sssp_diamond();
        let mut result = VertexCentricIteration::with_valued_edges(edges, MinDistance, Relax, 10)
            .run(vertices)
            .unwrap();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    };
    assert_eq!(run(), run());
}

/* ===================== connected components ===================== */

struct MinLabelUpdate;

impl VertexUpdateFunction<i64, i64, i64> for MinLabelUpdate {
    fn update_vertex(
        &self,
        _ctx: &mut UpdateContext<'_>,
        _key: &i64,
        state: &i64,
        messages: Messages<'_, i64>,
    ) -> Result<Option<i64>> {
        let smallest = messages.min().copied().unwrap_or(*state);
        Ok((smallest < *state).then_some(smallest))
    }
}

struct LabelMessenger;

impl MessagingFunction<i64, i64, i64, ()> for LabelMessenger {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, i64, ()>,
        _key: &i64,
        state: &i64,
    ) -> Result<()> {
        ctx.send_message_to_all_neighbours(*state)
    }
}

/// Explicit-multicast reference for the same algorithm: collects the
/// neighbour set through the cursor and multicasts to it.
struct LabelMulticastMessenger;

impl MessagingFunction<i64, i64, i64, ()> for LabelMulticastMessenger {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, i64, i64, ()>,
        _key: &i64,
        state: &i64,
    ) -> Result<()> {
        let neighbours: Vec<i64> = ctx.outgoing_edges()?.map(|e| e.target).collect();
        ctx.send_message_to_multiple_recipients(neighbours, *state);
        Ok(())
    }
}

const COMPONENT_LABELS: [(i64, i64); 6] = [(1, 1), (2, 1), (3, 1), (4, 4), (5, 4), (6, 6)];

#[test]
fn test_connected_components() {
    let (vertices, edges) = two_component_graph();
    let result =
        VertexCentricIteration::with_plain_edges(edges, MinLabelUpdate, LabelMessenger, 20)
            .run(vertices)
            .unwrap();

    assert_kv_collections_equal(result, COMPONENT_LABELS.to_vec());
}

#[test]
fn test_single_partition_matches_the_multicast_reference() {
    // With one channel, every neighbour send becomes a broadcast envelope
    // carrying the same representative; the output must still agree with the
    // explicit-multicast rendition of the same algorithm.
    let (vertices, edges) = two_component_graph();
    let broadcast = VertexCentricIteration::with_plain_edges(
        edges.clone(),
        MinLabelUpdate,
        LabelMessenger,
        20,
    )
    .set_parallelism(1)
    .run(vertices.clone())
    .unwrap();

    let multicast = VertexCentricIteration::with_plain_edges(
        edges,
        MinLabelUpdate,
        LabelMulticastMessenger,
        20,
    )
    .set_parallelism(1)
    .run(vertices)
    .unwrap();

    assert_kv_collections_equal(broadcast, COMPONENT_LABELS.to_vec());
    assert_kv_collections_equal(multicast, COMPONENT_LABELS.to_vec());
}

#[test]
fn test_components_with_unmanaged_solution_set() {
    let (vertices, edges) = two_component_graph();
    let result =
        VertexCentricIteration::with_plain_edges(edges, MinLabelUpdate, LabelMessenger, 20)
            .set_solution_set_unmanaged_memory(true)
            .run(vertices)
            .unwrap();

    assert_kv_collections_equal(result, COMPONENT_LABELS.to_vec());
}

/* ===================== PageRank ===================== */

struct RankUpdate;

impl VertexUpdateFunction<char, f64, f64> for RankUpdate {
    fn update_vertex(
        &self,
        _ctx: &mut UpdateContext<'_>,
        _key: &char,
        _state: &f64,
        messages: Messages<'_, f64>,
    ) -> Result<Option<f64>> {
        let sum: f64 = messages.sum();
        Ok(Some(0.15 / 4.0 + 0.85 * sum))
    }
}

struct RankMessenger;

impl MessagingFunction<char, f64, f64, ()> for RankMessenger {
    fn send_messages(
        &self,
        ctx: &mut MessagingContext<'_, char, f64, ()>,
        _key: &char,
        state: &f64,
    ) -> Result<()> {
        let degree = ctx
            .out_degree()
            .expect("degrees option is enabled for this job");
        if degree > 0 {
            ctx.send_message_to_all_neighbours(state / degree as f64)?;
        }
        Ok(())
    }
}

#[test]
fn test_pagerank_fixed_point_on_the_four_cycle() {
    let (vertices, edges) = four_cycle();
    let result = VertexCentricIteration::with_plain_edges(edges, RankUpdate, RankMessenger, 10)
        .set_opt_degrees(true)
        .run(vertices)
        .unwrap();

    assert_states_close(
        result,
        vec![('A', 0.25), ('B', 0.25), ('C', 0.25), ('D', 0.25)],
        1e-6,
    );
}

#[cfg(feature = "metrics")]
#[test]
fn test_pagerank_runs_exactly_to_the_superstep_bound() {
    use vertexflow::metrics::{MetricsCollector, SUPERSTEPS};

    let (vertices, edges) = four_cycle();
    let collector = MetricsCollector::new();
    VertexCentricIteration::with_plain_edges(edges, RankUpdate, RankMessenger, 10)
        .set_opt_degrees(true)
        .set_metrics(collector.clone())
        .run(vertices)
        .unwrap();

    // Every vertex stays active, so only the bound stops the job.
    assert_eq!(collector.counter(SUPERSTEPS), Some(10));
}
