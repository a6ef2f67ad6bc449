//! Minimum spanning tree construction (Prim) and the resulting parent table.

use indexmap::IndexMap;
use narwhal_graph::{GraphAccess, VertexId};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::metric::Metric;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEntry {
    pub parent: VertexId,
    pub weight: f64,
}

/// Parent table of a spanning tree, keyed by vertex id.
///
/// Every tree vertex except the root has exactly one entry. Entries are kept in the order the
/// vertices joined the tree, which is also a valid parent-before-child placement order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanningTree {
    root: VertexId,
    entries: IndexMap<VertexId, TreeEntry>,
    total_weight: f64,
}

impl SpanningTree {
    /// Grows a minimum spanning tree from `start`.
    ///
    /// With `finish`, growth stops as soon as that vertex joins the tree. Otherwise every vertex
    /// must be reachable, or the build fails with [`Error::DisconnectedGraph`]. Ties on weight go
    /// to the lowest vertex id.
    pub fn build<G: GraphAccess + ?Sized>(
        metric: &Metric<'_, G>,
        start: VertexId,
        finish: Option<VertexId>,
    ) -> Result<Self> {
        let ids = metric.vertices();
        let slot_of: FxHashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let Some(&start_slot) = slot_of.get(&start) else {
            return Err(Error::UnknownVertex { vertex: start });
        };

        let n = ids.len();
        let mut key = vec![f64::INFINITY; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut in_tree = vec![false; n];

        let mut tree = Self {
            root: start,
            entries: IndexMap::new(),
            total_weight: 0.0,
        };
        if finish == Some(start) {
            return Ok(tree);
        }

        in_tree[start_slot] = true;
        relax(metric, &ids, &slot_of, start_slot, &in_tree, &mut key, &mut parent);

        for _ in 1..n {
            let mut best: Option<usize> = None;
            for slot in 0..n {
                if in_tree[slot] || !key[slot].is_finite() {
                    continue;
                }
                // `ids` is ascending, so strict comparison keeps the lowest id on ties.
                if best.is_none_or(|b| key[slot] < key[b]) {
                    best = Some(slot);
                }
            }
            let Some(slot) = best else {
                let unreachable = (0..n)
                    .find(|&s| !in_tree[s])
                    .map(|s| ids[s])
                    .unwrap_or(start);
                return Err(Error::DisconnectedGraph { start, unreachable });
            };
            let Some(parent_slot) = parent[slot] else {
                return Err(Error::DisconnectedGraph {
                    start,
                    unreachable: ids[slot],
                });
            };

            in_tree[slot] = true;
            tree.entries.insert(
                ids[slot],
                TreeEntry {
                    parent: ids[parent_slot],
                    weight: key[slot],
                },
            );
            tree.total_weight += key[slot];
            tracing::trace!(
                vertex = ids[slot],
                parent = ids[parent_slot],
                weight = key[slot],
                "tree edge"
            );

            if finish == Some(ids[slot]) {
                break;
            }
            relax(metric, &ids, &slot_of, slot, &in_tree, &mut key, &mut parent);
        }

        Ok(tree)
    }

    pub fn root(&self) -> VertexId {
        self.root
    }

    /// Number of vertices in the tree, root included.
    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, v: VertexId) -> bool {
        v == self.root || self.entries.contains_key(&v)
    }

    pub fn entry(&self, v: VertexId) -> Option<&TreeEntry> {
        self.entries.get(&v)
    }

    pub fn entries(&self) -> impl Iterator<Item = (VertexId, &TreeEntry)> {
        self.entries.iter().map(|(&v, e)| (v, e))
    }

    pub fn parent(&self, v: VertexId) -> Option<VertexId> {
        self.entries.get(&v).map(|e| e.parent)
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Tree vertices in the order they joined the tree, root first.
    pub fn order(&self) -> Vec<VertexId> {
        std::iter::once(self.root)
            .chain(self.entries.keys().copied())
            .collect()
    }

    /// Children of `v`, in the order they joined the tree.
    pub fn children(&self, v: VertexId) -> Vec<VertexId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.parent == v)
            .map(|(&c, _)| c)
            .collect()
    }

    /// The next connecting vertex after `v`: its first child.
    pub fn successor(&self, v: VertexId) -> Option<VertexId> {
        self.entries
            .iter()
            .find(|(_, e)| e.parent == v)
            .map(|(&c, _)| c)
    }

    /// Summed tree weights from `v` up to `ancestor`, or `None` when `ancestor` is not on the path
    /// from `v` to the root.
    pub fn path_weight(&self, v: VertexId, ancestor: VertexId) -> Option<f64> {
        if !self.contains(v) {
            return None;
        }
        let mut total = 0.0;
        let mut cur = v;
        for _ in 0..self.len() {
            if cur == ancestor {
                return Some(total);
            }
            let entry = self.entries.get(&cur)?;
            total += entry.weight;
            cur = entry.parent;
        }
        (cur == ancestor).then_some(total)
    }

    /// `v`, its parent, its grandparent, ... up to the root. Empty if `v` is not in the tree.
    pub fn path_to_root(&self, v: VertexId) -> Vec<VertexId> {
        if !self.contains(v) {
            return Vec::new();
        }
        let mut path = vec![v];
        let mut cur = v;
        while let Some(p) = self.parent(cur) {
            path.push(p);
            cur = p;
            if path.len() > self.len() {
                debug_assert!(false, "spanning tree parent table has a cycle");
                break;
            }
        }
        path
    }
}

fn relax<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    ids: &[VertexId],
    slot_of: &FxHashMap<VertexId, usize>,
    from: usize,
    in_tree: &[bool],
    key: &mut [f64],
    parent: &mut [Option<usize>],
) {
    let v = ids[from];
    for u in metric.candidates(v) {
        let Some(&slot) = slot_of.get(&u) else {
            continue;
        };
        if in_tree[slot] {
            continue;
        }
        let Some(w) = metric.weight(v, u) else {
            continue;
        };
        if w < key[slot] {
            key[slot] = w;
            parent[slot] = Some(from);
        }
    }
}
