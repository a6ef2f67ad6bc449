//! Arena-backed weighted graph.

use crate::access::{GraphAccess, VertexId};
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone)]
struct VertexEntry {
    label: String,
    attributes: Option<Vec<f64>>,
    coordinates: Option<Vec<f64>>,
    visited: bool,
}

/// Undirected edge key, normalized so that `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    lo: VertexId,
    hi: VertexId,
}

impl PairKey {
    fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// An edge-weighted, undirected graph whose vertices live in a flat arena addressed by
/// [`VertexId`].
///
/// Labels are kept only for hosts (CLI output, documents); the core works on ids.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    vertices: Vec<VertexEntry>,
    label_index: HashMap<String, VertexId>,
    weights: HashMap<PairKey, f64>,
    adjacency: Vec<Vec<VertexId>>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a complete graph from a symmetric distance matrix. `None` entries mean "no edge".
    ///
    /// Only the upper triangle is read; vertices are labelled `"0"`, `"1"`, ...
    pub fn from_distance_matrix(matrix: &[Vec<Option<f64>>]) -> Self {
        let mut g = Self::new();
        for i in 0..matrix.len() {
            g.add_vertex(i.to_string());
        }
        for (i, row) in matrix.iter().enumerate() {
            for (j, w) in row.iter().enumerate().skip(i + 1) {
                if j >= matrix.len() {
                    break;
                }
                if let Some(w) = w {
                    g.set_weight(i, j, *w);
                }
            }
        }
        g
    }

    /// Adds a vertex, or returns the existing id when the label is already present.
    pub fn add_vertex(&mut self, label: impl Into<String>) -> VertexId {
        let label = label.into();
        if let Some(&id) = self.label_index.get(&label) {
            return id;
        }
        let id = self.vertices.len();
        self.label_index.insert(label.clone(), id);
        self.vertices.push(VertexEntry {
            label,
            attributes: None,
            coordinates: None,
            visited: false,
        });
        self.adjacency.push(Vec::new());
        id
    }

    pub fn add_vertex_with_attributes(
        &mut self,
        label: impl Into<String>,
        attributes: Vec<f64>,
    ) -> VertexId {
        let id = self.add_vertex(label);
        self.vertices[id].attributes = Some(attributes);
        id
    }

    /// Sets the symmetric weight between `a` and `b`. Self loops and unknown ids are ignored.
    pub fn set_weight(&mut self, a: VertexId, b: VertexId, weight: f64) -> &mut Self {
        if a == b || a >= self.vertices.len() || b >= self.vertices.len() {
            return self;
        }
        if self.weights.insert(PairKey::new(a, b), weight).is_none() {
            insert_sorted(&mut self.adjacency[a], b);
            insert_sorted(&mut self.adjacency[b], a);
        }
        self
    }

    pub fn remove_weight(&mut self, a: VertexId, b: VertexId) -> Option<f64> {
        let removed = self.weights.remove(&PairKey::new(a, b))?;
        self.adjacency[a].retain(|&x| x != b);
        self.adjacency[b].retain(|&x| x != a);
        Some(removed)
    }

    pub fn vertex_id(&self, label: &str) -> Option<VertexId> {
        self.label_index.get(label).copied()
    }

    pub fn label(&self, v: VertexId) -> Option<&str> {
        self.vertices.get(v).map(|e| e.label.as_str())
    }

    /// Vertices sharing an edge with `v`, in ascending id order.
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        self.adjacency.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    /// Edges as `(lo, hi, weight)` triples, sorted by endpoints.
    pub fn edges(&self) -> Vec<(VertexId, VertexId, f64)> {
        let mut out: Vec<(VertexId, VertexId, f64)> = self
            .weights
            .iter()
            .map(|(k, w)| (k.lo, k.hi, *w))
            .collect();
        out.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        out
    }

    pub fn clear_coordinates(&mut self) {
        for v in &mut self.vertices {
            v.coordinates = None;
            v.visited = false;
        }
    }
}

fn insert_sorted(list: &mut Vec<VertexId>, v: VertexId) {
    if let Err(pos) = list.binary_search(&v) {
        list.insert(pos, v);
    }
}

impl GraphAccess for WeightedGraph {
    fn vertices(&self) -> Vec<VertexId> {
        (0..self.vertices.len()).collect()
    }

    fn contains(&self, v: VertexId) -> bool {
        v < self.vertices.len()
    }

    fn weight(&self, a: VertexId, b: VertexId) -> Option<f64> {
        if a == b {
            return self.contains(a).then_some(0.0);
        }
        self.weights.get(&PairKey::new(a, b)).copied()
    }

    fn attributes(&self, v: VertexId) -> Option<&[f64]> {
        self.vertices.get(v)?.attributes.as_deref()
    }

    fn neighbors(&self, v: VertexId) -> Vec<VertexId> {
        WeightedGraph::neighbors(self, v).to_vec()
    }

    fn coordinates(&self, v: VertexId) -> Option<&[f64]> {
        self.vertices.get(v)?.coordinates.as_deref()
    }

    fn set_coordinates(&mut self, v: VertexId, coordinates: Vec<f64>) {
        if let Some(entry) = self.vertices.get_mut(v) {
            entry.coordinates = Some(coordinates);
        }
    }

    fn is_visited(&self, v: VertexId) -> bool {
        self.vertices.get(v).is_some_and(|e| e.visited)
    }

    fn set_visited(&mut self, v: VertexId, visited: bool) {
        if let Some(entry) = self.vertices.get_mut(v) {
            entry.visited = visited;
        }
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}
