//! Pivot bookkeeping: the outer boundary of the growing triangulation and the scores used to
//! rank candidate pivot facets.

use indexmap::IndexMap;
use nalgebra::DMatrix;
use narwhal_graph::VertexId;

use crate::geometry::{self, Point};

/// Pivots chosen for one vertex, with the known distances from that vertex to each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotChoice {
    pub pivots: Vec<VertexId>,
    pub distances: Vec<f64>,
}

/// Facets (sorted pivot tuples) of the triangulation built so far, with how often each one has
/// been used as a pivot facet.
///
/// In the plane a facet is an edge; in `d` dimensions it is a `d`-tuple of vertices.
#[derive(Debug, Clone)]
pub(crate) struct Boundary {
    uses: IndexMap<Vec<VertexId>, u8>,
    limit: u8,
}

impl Boundary {
    pub(crate) fn new(limit: u8) -> Self {
        Self {
            uses: IndexMap::new(),
            limit,
        }
    }

    pub(crate) fn seed(&mut self, facet: &[VertexId]) {
        self.uses.entry(sorted(facet)).or_insert(0);
    }

    /// Facets still on the outside of the triangulation, in creation order.
    pub(crate) fn candidates(&self) -> impl Iterator<Item = &[VertexId]> {
        self.uses
            .iter()
            .filter(|(_, n)| **n < self.limit)
            .map(|(f, _)| f.as_slice())
    }

    /// Records that `v` was placed against `facet`, which adds the facets obtained by swapping
    /// each member of `facet` for `v`.
    pub(crate) fn record(&mut self, facet: &[VertexId], v: VertexId) {
        let key = sorted(facet);
        let n = self.uses.entry(key.clone()).or_insert(0);
        *n = n.saturating_add(1);
        for i in 0..key.len() {
            let mut next = key.clone();
            next[i] = v;
            self.uses.entry(sorted(&next)).or_insert(0);
        }
    }

    #[cfg(test)]
    pub(crate) fn uses(&self, facet: &[VertexId]) -> Option<u8> {
        self.uses.get(&sorted(facet)).copied()
    }
}

fn sorted(facet: &[VertexId]) -> Vec<VertexId> {
    let mut out = facet.to_vec();
    out.sort_unstable();
    out
}

/// Summed distances from the new vertex to the pivots.
pub(crate) fn perimeter(distances: &[f64]) -> f64 {
    distances.iter().sum()
}

/// Area (hypervolume) of the simplex spanned by the pivots and the new vertex.
///
/// Pivot-to-pivot sides come from `known(i, j)` when it has a distance, else from the placed
/// coordinates. Sides to the new vertex are `distances`.
pub(crate) fn simplex_measure(
    points: &[&Point],
    distances: &[f64],
    known: impl Fn(usize, usize) -> Option<f64>,
) -> f64 {
    let side = |i: usize, j: usize| known(i, j).unwrap_or_else(|| (points[i] - points[j]).norm());
    if points.len() == 2 {
        return geometry::heron_area(side(0, 1), distances[0], distances[1]);
    }
    let n = points.len() + 1;
    let mut d = DMatrix::<f64>::zeros(n, n);
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dij = side(i, j);
            d[(i, j)] = dij;
            d[(j, i)] = dij;
        }
        d[(i, n - 1)] = distances[i];
        d[(n - 1, i)] = distances[i];
    }
    geometry::simplex_volume(&d)
}
