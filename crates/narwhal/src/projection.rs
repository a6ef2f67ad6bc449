use indexmap::IndexMap;
use narwhal_graph::VertexId;

use crate::pivot::PivotChoice;
use crate::tree::SpanningTree;

/// Outcome of one projection run.
///
/// The same coordinates have already been written to the graph; this value adds the traversal
/// artifacts and quality figures the graph has no room for.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub dimensions: usize,
    /// Final coordinates, in placement order.
    pub coordinates: IndexMap<VertexId, Vec<f64>>,
    pub order: Vec<VertexId>,
    pub tree: SpanningTree,
    /// Pivots used for every vertex placed by trilateration (the starting simplex has none).
    pub pivots: IndexMap<VertexId, PivotChoice>,
    /// Nearest-neighbor chain from the start vertex, when requested.
    pub nnc: Option<Vec<VertexId>>,
    /// Neighbors of the start vertex by ascending weight, when requested.
    pub emanating_edges: Option<Vec<VertexId>>,
    /// Lambda used by each refinement pass that ran.
    pub lambdas: Vec<f64>,
    /// Stress right after initial placement.
    pub initial_stress: f64,
    pub(crate) final_stress: f64,
}

impl Projection {
    pub fn coordinates_of(&self, v: VertexId) -> Option<&[f64]> {
        self.coordinates.get(&v).map(Vec::as_slice)
    }

    /// Refinement passes that ran.
    pub fn iterations(&self) -> usize {
        self.lambdas.len()
    }

    /// Raw stress `sum (|p_a - p_b| - w_ab)^2` over every known weight between placed vertices.
    pub fn stress(&self) -> f64 {
        self.final_stress
    }
}
