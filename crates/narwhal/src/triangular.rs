//! Planar projection: every vertex after the first two is triangulated against two pivots.

use narwhal_graph::{GraphAccess, VertexId};

use crate::error::{Error, Result};
use crate::options::{ProjectionKind, ProjectionOptions};
use crate::projection::Projection;
use crate::task::{CancellationToken, Phase};

/// Projects every vertex reachable from `start` into the plane.
///
/// `dimension_columns` selects attribute columns to derive weights from (empty for stored
/// weights). At most one of `minimum_area` and `minimum_perimeter` takes effect; area wins.
pub fn triangular_projection<G: GraphAccess + ?Sized>(
    graph: &mut G,
    start: VertexId,
    dimension_columns: &[usize],
    minimum_area: bool,
    minimum_perimeter: bool,
    number_of_iterations: usize,
) -> Result<Projection> {
    let options = ProjectionOptions {
        dimension_columns: dimension_columns.to_vec(),
        minimum_area,
        minimum_perimeter,
        number_of_iterations,
        ..ProjectionOptions::triangular(start)
    };
    project(graph, &options, &CancellationToken::new(), &mut |_: Phase| {})
}

pub(crate) fn project<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(Phase),
) -> Result<Projection> {
    if options.kind != ProjectionKind::Triangular {
        return Err(Error::invalid(
            "projectionType",
            format!("triangular projection cannot produce {} axes", options.dimensions()),
        ));
    }
    crate::engine::run(graph, options, cancel, progress)
}
