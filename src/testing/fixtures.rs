//! Pre-built graphs for common test scenarios.

/// A small weighted diamond for shortest-path tests.
///
/// Vertices `A..D` with source `A` at distance `0.0` and everything else at
/// infinity; edges `A→B(1) A→C(4) B→C(2) B→D(5) C→D(1)`. The single-source
/// shortest paths from `A` are `{A: 0, B: 1, C: 3, D: 4}`.
pub fn sssp_diamond() -> (Vec<(char, f64)>, Vec<(char, char, f64)>) {
    let vertices = vec![
        ('A', 0.0),
        ('B', f64::INFINITY),
        ('C', f64::INFINITY),
        ('D', f64::INFINITY),
    ];
    let edges = vec![
        ('A', 'B', 1.0),
        ('A', 'C', 4.0),
        ('B', 'C', 2.0),
        ('B', 'D', 5.0),
        ('C', 'D', 1.0),
    ];
    (vertices, edges)
}

/// An undirected graph with two non-trivial components and one isolated
/// vertex, for label-propagation tests.
///
/// Vertices `1..=6` labelled with their own id; undirected edges `1-2`,
/// `2-3`, `4-5` (each as a pair of directed edges). Minimum-label propagation
/// converges to `{1: 1, 2: 1, 3: 1, 4: 4, 5: 4, 6: 6}`.
pub fn two_component_graph() -> (Vec<(i64, i64)>, Vec<(i64, i64)>) {
    let vertices = (1..=6).map(|k| (k, k)).collect();
    let edges = vec![(1, 2), (2, 1), (2, 3), (3, 2), (4, 5), (5, 4)];
    (vertices, edges)
}

/// The directed four-cycle `A→B→C→D→A` with uniform rank `0.25` everywhere.
///
/// Under PageRank with damping `0.85`, the uniform distribution is the fixed
/// point: every superstep reproduces `0.25` per vertex.
pub fn four_cycle() -> (Vec<(char, f64)>, Vec<(char, char)>) {
    let vertices = vec![('A', 0.25), ('B', 0.25), ('C', 0.25), ('D', 0.25)];
    let edges = vec![('A', 'B'), ('B', 'C'), ('C', 'D'), ('D', 'A')];
    (vertices, edges)
}
