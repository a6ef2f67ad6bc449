//! Geometric coordinatizer: a placement order chosen for triangulation conditioning.
//!
//! The ordering starts from the best-connected vertex, grows the largest-volume starting simplex
//! it can from known distances, and then keeps taking the vertex with the most known distances to
//! everything already ordered. It never writes to the graph.

use nalgebra::DMatrix;
use narwhal_graph::{GraphAccess, VertexId};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::geometry;
use crate::metric::Metric;

/// A permutation (or prefix of one) of a graph's vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reordering {
    order: Vec<VertexId>,
}

impl Reordering {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[VertexId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.order.iter().copied()
    }

    /// Rank of `v` in the ordering.
    pub fn position(&self, v: VertexId) -> Option<usize> {
        self.order.iter().position(|&u| u == v)
    }
}

/// Orders the first `number_of_nodes` vertices of `graph` using its stored weights.
///
/// `number_of_nodes` larger than the vertex count orders every vertex.
pub fn reorder<G: GraphAccess + ?Sized>(
    graph: &G,
    number_of_nodes: usize,
    number_of_dimensions: usize,
) -> Result<Reordering> {
    reorder_with(&Metric::stored(graph), number_of_nodes, number_of_dimensions)
}

pub fn reorder_with<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    number_of_nodes: usize,
    number_of_dimensions: usize,
) -> Result<Reordering> {
    if number_of_dimensions < 2 {
        return Err(Error::invalid(
            "numberOfDimensions",
            format!("must be at least 2, got {number_of_dimensions}"),
        ));
    }
    let ids = metric.vertices();
    let target = number_of_nodes.min(ids.len());
    let mut order: Vec<VertexId> = Vec::with_capacity(target);
    let mut taken: FxHashSet<VertexId> = FxHashSet::default();
    if target == 0 {
        return Ok(Reordering { order });
    }

    let Some(seed) = seed_vertex(metric, &ids) else {
        return Ok(Reordering { order });
    };
    order.push(seed);
    taken.insert(seed);

    // Simplex: each step adds the vertex spanning the largest volume with the ones already taken.
    while order.len() < target && order.len() < number_of_dimensions {
        let mut best: Option<(f64, VertexId)> = None;
        for &v in &ids {
            if taken.contains(&v) {
                continue;
            }
            let Some(volume) = simplex_volume_with(metric, &order, v) else {
                continue;
            };
            if volume > geometry::EPSILON && best.is_none_or(|(b, _)| smaller(b, volume)) {
                best = Some((volume, v));
            }
        }
        let Some((_, v)) = best else {
            break;
        };
        order.push(v);
        taken.insert(v);
    }
    tracing::debug!(simplex = ?order, "coordinatizer simplex");

    // Greedy: most known distances to the ordered set, then smallest summed distance, then id.
    while order.len() < target {
        let mut best: Option<(usize, f64, VertexId)> = None;
        for &v in &ids {
            if taken.contains(&v) {
                continue;
            }
            let (links, sum) = order
                .iter()
                .filter_map(|&u| metric.weight(v, u))
                .fold((0usize, 0.0f64), |(n, s), w| (n + 1, s + w));
            let better = match best {
                None => true,
                Some((bn, bs, _)) => links > bn || (links == bn && smaller(sum, bs)),
            };
            if better {
                best = Some((links, sum, v));
            }
        }
        let Some((_, _, v)) = best else {
            break;
        };
        order.push(v);
        taken.insert(v);
    }

    Ok(Reordering { order })
}

/// Vertex with the most known distances, then the smallest summed distance, then the lowest id.
fn seed_vertex<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    ids: &[VertexId],
) -> Option<VertexId> {
    let mut best: Option<(usize, f64, VertexId)> = None;
    for &v in ids {
        let (degree, sum) = ids
            .iter()
            .filter(|&&u| u != v)
            .filter_map(|&u| metric.weight(v, u))
            .fold((0usize, 0.0f64), |(n, s), w| (n + 1, s + w));
        let better = match best {
            None => true,
            Some((bd, bs, _)) => degree > bd || (degree == bd && smaller(sum, bs)),
        };
        if better {
            best = Some((degree, sum, v));
        }
    }
    best.map(|(_, _, v)| v)
}

/// `a < b` beyond round-off.
fn smaller(a: f64, b: f64) -> bool {
    a < b - geometry::EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Volume of the simplex on `ordered` plus `v`, or `None` when a pairwise distance is unknown.
fn simplex_volume_with<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    ordered: &[VertexId],
    v: VertexId,
) -> Option<f64> {
    let members: Vec<VertexId> = ordered.iter().copied().chain(std::iter::once(v)).collect();
    let n = members.len();
    let mut d = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let w = metric.weight(members[i], members[j])?;
            d[(i, j)] = w;
            d[(j, i)] = w;
        }
    }
    Some(geometry::simplex_volume(&d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_graph::WeightedGraph;

    #[test]
    fn seed_prefers_degree_then_weight() {
        let mut g = WeightedGraph::new();
        for label in ["a", "b", "c", "d"] {
            g.add_vertex(label);
        }
        g.set_weight(0, 1, 5.0).set_weight(1, 2, 1.0).set_weight(1, 3, 1.0);
        g.set_weight(2, 3, 1.0);
        let metric = Metric::stored(&g);
        let ids = metric.vertices();
        // b has three links, c and d two each.
        assert_eq!(seed_vertex(&metric, &ids), Some(1));
    }

    #[test]
    fn volume_needs_every_pairwise_distance() {
        let mut g = WeightedGraph::new();
        for label in ["a", "b", "c"] {
            g.add_vertex(label);
        }
        g.set_weight(0, 1, 3.0).set_weight(0, 2, 4.0);
        let metric = Metric::stored(&g);
        assert_eq!(simplex_volume_with(&metric, &[0, 1], 2), None);
        g.set_weight(1, 2, 5.0);
        let metric = Metric::stored(&g);
        let area = simplex_volume_with(&metric, &[0, 1], 2).unwrap();
        assert!((area - 6.0).abs() < 1e-9);
    }
}
