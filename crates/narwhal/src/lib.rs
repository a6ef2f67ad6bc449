#![forbid(unsafe_code)]

//! Distance-geometry projection of weighted graphs.
//!
//! Vertices are placed one at a time in minimum-spanning-tree order: the first few form a
//! canonical simplex, every later vertex is trilaterated against already-placed pivots, and a
//! few damped refinement passes then pull the configuration toward the known distances. The
//! planar case is [`triangular`], the general case [`polyhedral`]; both share one placement core.
//!
//! Graphs are reached through [`narwhal_graph::GraphAccess`], so any container that can report
//! weights and store coordinates works.

pub mod config;
pub mod coordinatizer;
mod engine;
pub mod error;
pub mod geometry;
pub mod metric;
pub mod nearest;
pub mod options;
pub mod pivot;
mod placement;
pub mod polyhedral;
mod projection;
pub mod refine;
pub mod task;
pub mod tree;
pub mod triangular;

use narwhal_graph::{GraphAccess, VertexId};

pub use config::{ProjectionConfig, ProjectionType};
pub use coordinatizer::{Reordering, reorder};
pub use error::{Error, Result};
pub use metric::Metric;
pub use nearest::{Neighbor, VisitedSet, nearest_neighbor};
pub use options::{
    DEFAULT_ITERATIONS, LambdaDecay, PivotPolicy, ProjectionKind, ProjectionOptions,
    RefinementOptions,
};
pub use pivot::PivotChoice;
pub use polyhedral::polyhedral_projection;
pub use projection::Projection;
pub use task::{CancellationToken, Phase, ProjectionTask};
pub use tree::{SpanningTree, TreeEntry};
pub use triangular::triangular_projection;

/// Runs one projection to completion and writes the coordinates to `graph`.
pub fn project<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
) -> Result<Projection> {
    dispatch(graph, options, &CancellationToken::new(), &mut |_: Phase| {})
}

/// Async wrapper around [`project`] (no runtime dependency).
pub async fn project_async<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
) -> Result<Projection> {
    project(graph, options)
}

/// Minimum spanning tree of `graph` from `start`, on stored weights.
pub fn spanning_tree<G: GraphAccess + ?Sized>(graph: &G, start: VertexId) -> Result<SpanningTree> {
    SpanningTree::build(&Metric::stored(graph), start, None)
}

fn dispatch<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(Phase),
) -> Result<Projection> {
    match options.kind {
        ProjectionKind::Triangular => triangular::project(graph, options, cancel, progress),
        ProjectionKind::Polyhedral { .. } => polyhedral::project(graph, options, cancel, progress),
    }
}
