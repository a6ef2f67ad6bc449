//! N-dimensional projection: each vertex after the starting simplex is trilaterated against as
//! many pivots as there are output axes.

use narwhal_graph::{GraphAccess, VertexId};

use crate::error::{Error, Result};
use crate::options::{ProjectionKind, ProjectionOptions};
use crate::projection::Projection;
use crate::task::{CancellationToken, Phase};

/// Projects every vertex reachable from `start` into `number_of_dimensions` axes.
pub fn polyhedral_projection<G: GraphAccess + ?Sized>(
    graph: &mut G,
    start: VertexId,
    number_of_dimensions: usize,
    number_of_iterations: usize,
) -> Result<Projection> {
    let options = ProjectionOptions {
        number_of_iterations,
        ..ProjectionOptions::polyhedral(start, number_of_dimensions)
    };
    project(graph, &options, &CancellationToken::new(), &mut |_: Phase| {})
}

pub(crate) fn project<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(Phase),
) -> Result<Projection> {
    let ProjectionKind::Polyhedral { dimensions } = options.kind else {
        return Err(Error::invalid(
            "projectionType",
            "polyhedral projection needs an explicit dimension count",
        ));
    };
    if dimensions < 2 {
        return Err(Error::invalid(
            "numberOfDimensions",
            format!("must be at least 2, got {dimensions}"),
        ));
    }
    crate::engine::run(graph, options, cancel, progress)
}
