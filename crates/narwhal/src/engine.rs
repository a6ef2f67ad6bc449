//! One projection run: tree, placement order, initial placement, refinement, commits.

use std::time::{Duration, Instant};

use narwhal_graph::{GraphAccess, VertexId};

use crate::coordinatizer;
use crate::error::Result;
use crate::metric::Metric;
use crate::nearest::{VisitedSet, emanating_edges, nearest_neighbor_chain};
use crate::options::ProjectionOptions;
use crate::placement::{self, Placement};
use crate::projection::Projection;
use crate::refine::LambdaSchedule;
use crate::task::{CancellationToken, Phase};
use crate::tree::SpanningTree;

#[derive(Debug, Default, Clone, Copy)]
struct ProjectionTimings {
    total: Duration,
    tree: Duration,
    placement: Duration,
    refinement: Duration,
}

/// Runs a projection against `graph`.
///
/// Nothing is written before the initial placement succeeds. From then on the graph is updated
/// once per phase, so a cancelled or failed refinement leaves the last completed pass in place.
pub(crate) fn run<G: GraphAccess + ?Sized>(
    graph: &mut G,
    options: &ProjectionOptions,
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(Phase),
) -> Result<Projection> {
    options.validate(&*graph)?;
    let dims = options.dimensions();
    let span = tracing::info_span!("projection", dims, start = options.start);
    let _enter = span.enter();

    let timing_enabled = std::env::var("NARWHAL_TIMING").ok().as_deref() == Some("1");
    let mut timings = ProjectionTimings::default();
    let total_start = timing_enabled.then(Instant::now);

    cancel.check()?;
    let tree_start = timing_enabled.then(Instant::now);
    let (tree, order, nnc, emanating) = {
        let metric = Metric::new(&*graph, &options.dimension_columns);
        let tree = SpanningTree::build(&metric, options.start, options.finish)?;
        let order = placement_order(&metric, &tree, options)?;

        // Diagnostics stay inside the tree's reach.
        let outside: VisitedSet = metric
            .vertices()
            .into_iter()
            .filter(|&v| !tree.contains(v))
            .collect();
        let nnc = options
            .map_nnc
            .then(|| nearest_neighbor_chain(&metric, options.start, outside.clone()));
        let emanating = options
            .map_emanating_edges
            .then(|| emanating_edges(&metric, options.start, outside));
        (tree, order, nnc, emanating)
    };
    if let Some(s) = tree_start {
        timings.tree = s.elapsed();
    }
    tracing::debug!(
        vertices = tree.len(),
        total_weight = tree.total_weight(),
        reorder = options.reorder,
        "spanning tree built"
    );
    progress(Phase::TreeBuilt);

    cancel.check()?;
    let placement_start = timing_enabled.then(Instant::now);
    let mut placement = Placement::new(options);
    let initial_stress = {
        let metric = Metric::new(&*graph, &options.dimension_columns);
        placement.place_all(&metric, &tree, &order)?;
        placement::stress(&metric, placement.positions())
    };
    commit(graph, &placement, true);
    if let Some(s) = placement_start {
        timings.placement = s.elapsed();
    }
    tracing::debug!(
        placed = placement.positions().len(),
        stress = initial_stress,
        policy = ?options.pivot_policy(),
        "initial placement committed"
    );
    progress(Phase::Placed);

    let refinement_start = timing_enabled.then(Instant::now);
    let mut schedule = LambdaSchedule::new(&options.refinement, options.number_of_iterations);
    let mut lambdas = Vec::new();
    while !schedule.is_exhausted() {
        cancel.check()?;
        let lambda = schedule.lambda();
        let shift = {
            let metric = Metric::new(&*graph, &options.dimension_columns);
            placement.refine_pass(&metric, lambda)?
        };
        commit(graph, &placement, false);
        lambdas.push(lambda);
        schedule.reduce();
        tracing::trace!(iteration = schedule.iteration(), lambda, shift, "refinement pass");
        progress(Phase::Refined {
            iteration: schedule.iteration(),
        });
    }
    if let Some(s) = refinement_start {
        timings.refinement = s.elapsed();
    }

    let final_stress = {
        let metric = Metric::new(&*graph, &options.dimension_columns);
        placement::stress(&metric, placement.positions())
    };
    tracing::info!(
        vertices = placement.positions().len(),
        iterations = lambdas.len(),
        initial_stress,
        stress = final_stress,
        "projection complete"
    );

    if let Some(s) = total_start {
        timings.total = s.elapsed();
        eprintln!(
            "[narwhal-timing] total={:?} tree={:?} placement={:?} refinement={:?} vertices={} dims={} iterations={}",
            timings.total,
            timings.tree,
            timings.placement,
            timings.refinement,
            placement.positions().len(),
            dims,
            lambdas.len(),
        );
    }

    Ok(Projection {
        dimensions: dims,
        coordinates: placement
            .positions()
            .iter()
            .map(|(&v, p)| (v, p.iter().copied().collect()))
            .collect(),
        order,
        tree,
        pivots: placement.choices().clone(),
        nnc,
        emanating_edges: emanating,
        lambdas,
        initial_stress,
        final_stress,
    })
}

fn placement_order<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    tree: &SpanningTree,
    options: &ProjectionOptions,
) -> Result<Vec<VertexId>> {
    if !options.reorder {
        return Ok(tree.order());
    }
    let reordering =
        coordinatizer::reorder_with(metric, metric.vertices().len(), options.dimensions())?;
    Ok(reordering
        .iter()
        .filter(|&v| tree.contains(v))
        .collect())
}

/// Writes the buffered positions to the graph. With `reset_visited`, visited markers are
/// rewritten too: set for placed vertices, cleared for everything else.
fn commit<G: GraphAccess + ?Sized>(graph: &mut G, placement: &Placement, reset_visited: bool) {
    let positions = placement.positions();
    for v in graph.vertices() {
        let placed = positions.get(&v);
        if let Some(p) = placed {
            graph.set_coordinates(v, p.iter().copied().collect());
        }
        if reset_visited {
            graph.set_visited(v, placed.is_some());
        }
    }
}
