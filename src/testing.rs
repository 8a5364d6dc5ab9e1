//! Testing utilities for vertex-centric iterations.
//!
//! This module helps users write idiomatic Rust tests for their graph jobs:
//!
//! - **Assertions**: compare result vertex sets with expected ones,
//!   independent of partition-induced ordering
//! - **Builders**: construct vertex and edge test data fluently
//! - **Fixtures**: small pre-built graphs for common scenarios
//!
//! # Quick Start
//!
//! ```ignore
//! use vertexflow::*;
//! use vertexflow::testing::*;
//!
//! #[test]
//! fn labels_converge() -> anyhow::Result<()> {
//!     let (vertices, edges) = two_component_graph();
//!     let result = VertexCentricIteration::with_plain_edges(
//!         edges, MinLabelUpdate, LabelMessenger, 20,
//!     )
//!     .run(vertices)?;
//!
//!     assert_kv_collections_equal(
//!         result,
//!         vec![(1, 1), (2, 1), (3, 1), (4, 4), (5, 4), (6, 6)],
//!     );
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
