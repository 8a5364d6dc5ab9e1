//! Fluent builders for graph test data.

/// Builds a vertex set and a plain edge set for tests.
///
/// # Example
///
/// ```
/// use vertexflow::testing::GraphBuilder;
///
/// let (vertices, edges) = GraphBuilder::new()
///     .add_vertex(1i64, 1i64)
///     .add_vertex(2, 2)
///     .add_undirected_edge(1, 2)
///     .build();
/// assert_eq!(vertices.len(), 2);
/// assert_eq!(edges.len(), 2);
/// ```
pub struct GraphBuilder<K, V> {
    vertices: Vec<(K, V)>,
    edges: Vec<(K, K)>,
}

impl<K: Clone, V> GraphBuilder<K, V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add one vertex.
    #[must_use]
    pub fn add_vertex(mut self, key: K, state: V) -> Self {
        self.vertices.push((key, state));
        self
    }

    /// Add vertices from any iterator of `(key, state)` pairs.
    #[must_use]
    pub fn add_vertices(mut self, vertices: impl IntoIterator<Item = (K, V)>) -> Self {
        self.vertices.extend(vertices);
        self
    }

    /// Add one directed edge.
    #[must_use]
    pub fn add_edge(mut self, source: K, target: K) -> Self {
        self.edges.push((source, target));
        self
    }

    /// Add a pair of directed edges, one in each direction.
    #[must_use]
    pub fn add_undirected_edge(mut self, a: K, b: K) -> Self {
        self.edges.push((a.clone(), b.clone()));
        self.edges.push((b, a));
        self
    }

    /// Finish, yielding `(vertices, edges)`.
    pub fn build(self) -> (Vec<(K, V)>, Vec<(K, K)>) {
        (self.vertices, self.edges)
    }
}
