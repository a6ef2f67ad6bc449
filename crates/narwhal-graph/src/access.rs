/// Stable vertex identifier (arena index).
pub type VertexId = usize;

/// The narrow view of a graph that the projection core needs.
///
/// Weights are symmetric and non-negative; `None` means "no edge". Coordinates and the visited
/// marker are the only state the core ever writes.
pub trait GraphAccess {
    /// All vertex identifiers, in ascending order.
    fn vertices(&self) -> Vec<VertexId>;

    fn contains(&self, v: VertexId) -> bool;

    fn weight(&self, a: VertexId, b: VertexId) -> Option<f64>;

    /// Per-vertex attribute row (one value per input variable), if the graph carries one.
    fn attributes(&self, _v: VertexId) -> Option<&[f64]> {
        None
    }

    /// Vertices sharing a stored weight with `v`.
    fn neighbors(&self, v: VertexId) -> Vec<VertexId> {
        self.vertices()
            .into_iter()
            .filter(|&u| u != v && self.weight(v, u).is_some())
            .collect()
    }

    fn coordinates(&self, v: VertexId) -> Option<&[f64]>;

    fn set_coordinates(&mut self, v: VertexId, coordinates: Vec<f64>);

    fn is_visited(&self, v: VertexId) -> bool;

    fn set_visited(&mut self, v: VertexId, visited: bool);

    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }
}
