use narwhal_graph::{GraphAccess, VertexId};

/// Read-only weight view over a graph.
///
/// With a column selection, the weight between two vertices that both carry attribute rows is the
/// Euclidean distance over those columns; every other pair falls back to the stored edge weight.
pub struct Metric<'g, G: GraphAccess + ?Sized> {
    graph: &'g G,
    columns: &'g [usize],
}

impl<'g, G: GraphAccess + ?Sized> Metric<'g, G> {
    pub fn new(graph: &'g G, columns: &'g [usize]) -> Self {
        Self { graph, columns }
    }

    /// Stored edge weights only.
    pub fn stored(graph: &'g G) -> Self {
        Self { graph, columns: &[] }
    }

    pub fn vertices(&self) -> Vec<VertexId> {
        let mut ids = self.graph.vertices();
        ids.sort_unstable();
        ids
    }

    /// Vertices that can have a known distance to `v`, ascending. Without a column selection
    /// these are the graph neighbors of `v`.
    pub fn candidates(&self, v: VertexId) -> Vec<VertexId> {
        if !self.columns.is_empty() {
            return self.vertices();
        }
        let mut ids = self.graph.neighbors(v);
        ids.sort_unstable();
        ids
    }

    /// Known distance between `a` and `b`. Negative or non-finite weights count as missing.
    pub fn weight(&self, a: VertexId, b: VertexId) -> Option<f64> {
        if !self.columns.is_empty() {
            if let (Some(ra), Some(rb)) = (self.graph.attributes(a), self.graph.attributes(b)) {
                return column_distance(ra, rb, self.columns);
            }
        }
        self.graph
            .weight(a, b)
            .filter(|w| w.is_finite() && *w >= 0.0)
    }
}

fn column_distance(a: &[f64], b: &[f64], columns: &[usize]) -> Option<f64> {
    let mut sum = 0.0;
    for &c in columns {
        let d = a.get(c)? - b.get(c)?;
        sum += d * d;
    }
    let d = sum.sqrt();
    d.is_finite().then_some(d)
}
