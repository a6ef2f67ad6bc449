//! Nearest-neighbor search under a visitation constraint, plus the diagnostic sequences built on
//! top of it.

use narwhal_graph::{GraphAccess, VertexId};
use rustc_hash::FxHashSet;

use crate::metric::Metric;

/// Vertices already consumed by a traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedSet {
    inner: FxHashSet<VertexId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, v: VertexId) -> bool {
        self.inner.insert(v)
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.inner.contains(&v)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<VertexId> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = VertexId>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub vertex: VertexId,
    pub weight: f64,
}

/// Returns the unvisited vertex closest to `node`, lowest id on ties.
///
/// `pre` sees `node` before the scan and `post` sees the outcome after it. Visited state is left
/// to the caller.
pub fn nearest_neighbor<G, Pre, Post>(
    metric: &Metric<'_, G>,
    node: VertexId,
    visited: &VisitedSet,
    mut pre: Pre,
    mut post: Post,
) -> Option<Neighbor>
where
    G: GraphAccess + ?Sized,
    Pre: FnMut(VertexId),
    Post: FnMut(Option<VertexId>),
{
    pre(node);
    let mut best: Option<Neighbor> = None;
    for u in metric.candidates(node) {
        if u == node || visited.contains(u) {
            continue;
        }
        let Some(weight) = metric.weight(node, u) else {
            continue;
        };
        if best.is_none_or(|b| weight < b.weight) {
            best = Some(Neighbor { vertex: u, weight });
        }
    }
    post(best.map(|b| b.vertex));
    best
}

/// Nearest-neighbor chain from `start`: keep stepping to the nearest unvisited vertex of the
/// current one until none is left.
pub fn nearest_neighbor_chain<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    start: VertexId,
    mut visited: VisitedSet,
) -> Vec<VertexId> {
    let mut chain: Vec<VertexId> = Vec::new();
    visited.insert(start);
    let mut current = start;
    while let Some(next) = nearest_neighbor(metric, current, &visited, |v| chain.push(v), |_| {}) {
        visited.insert(next.vertex);
        current = next.vertex;
    }
    chain
}

/// Vertices joined to `seed` by an edge, nearest first.
pub fn emanating_edges<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    seed: VertexId,
    mut visited: VisitedSet,
) -> Vec<VertexId> {
    let mut sequence: Vec<VertexId> = Vec::new();
    visited.insert(seed);
    loop {
        let found = nearest_neighbor(metric, seed, &visited, |_| {}, |found| {
            if let Some(v) = found {
                sequence.push(v);
            }
        });
        let Some(found) = found else {
            break;
        };
        visited.insert(found.vertex);
    }
    sequence
}
