//! Shared placement core for every dimensionality.
//!
//! The first `dims` vertices of the placement order form the canonical starting simplex and stay
//! fixed. Every later vertex is trilaterated against `dims` already-placed pivots chosen by the
//! active [`PivotPolicy`], with the mirror ambiguity resolved against the other placed vertices.
//! Refinement passes then re-derive each non-fixed vertex from a frozen snapshot of the previous
//! pass and blend the result in with the current lambda.

use std::cmp::Ordering;

use indexmap::IndexMap;
use narwhal_graph::{GraphAccess, VertexId};

use crate::error::{Error, Result};
use crate::geometry::{self, AffineHull, EPSILON, Point};
use crate::metric::Metric;
use crate::options::{PivotPolicy, ProjectionOptions};
use crate::pivot::{self, Boundary, PivotChoice};
use crate::tree::SpanningTree;

#[derive(Debug, Clone)]
pub(crate) struct Placement {
    dims: usize,
    policy: PivotPolicy,
    minimum_distance: bool,
    positions: IndexMap<VertexId, Point>,
    choices: IndexMap<VertexId, PivotChoice>,
    boundary: Boundary,
}

impl Placement {
    pub(crate) fn new(options: &ProjectionOptions) -> Self {
        Self {
            dims: options.dimensions(),
            policy: options.pivot_policy(),
            minimum_distance: options.minimum_distance,
            positions: IndexMap::new(),
            choices: IndexMap::new(),
            boundary: Boundary::new(options.boundary_use_limit),
        }
    }

    /// Placed vertices and their coordinates, in placement order.
    pub(crate) fn positions(&self) -> &IndexMap<VertexId, Point> {
        &self.positions
    }

    pub(crate) fn choices(&self) -> &IndexMap<VertexId, PivotChoice> {
        &self.choices
    }

    pub(crate) fn place_all<G: GraphAccess + ?Sized>(
        &mut self,
        metric: &Metric<'_, G>,
        tree: &SpanningTree,
        order: &[VertexId],
    ) -> Result<()> {
        for &v in order {
            if self.positions.len() < self.dims {
                self.place_simplex_vertex(metric, v)?;
            } else {
                self.place_vertex(metric, tree, v)?;
            }
        }
        Ok(())
    }

    fn place_simplex_vertex<G: GraphAccess + ?Sized>(
        &mut self,
        metric: &Metric<'_, G>,
        v: VertexId,
    ) -> Result<()> {
        let mut distances = Vec::with_capacity(self.positions.len());
        for &u in self.positions.keys() {
            let Some(d) = metric.weight(v, u) else {
                return Err(Error::degenerate(
                    v,
                    format!("no known distance to starting simplex vertex {u}"),
                ));
            };
            distances.push(d);
        }
        let placed: Vec<Point> = self.positions.values().cloned().collect();
        let p = geometry::simplex_vertex(&placed, &distances, self.dims)
            .ok_or_else(|| Error::degenerate(v, "starting simplex is flat"))?;
        tracing::trace!(vertex = v, "placed starting simplex vertex");
        self.positions.insert(v, p);

        if self.positions.len() == self.dims {
            let facet: Vec<VertexId> = self.positions.keys().copied().collect();
            self.boundary.seed(&facet);
        }
        Ok(())
    }

    fn place_vertex<G: GraphAccess + ?Sized>(
        &mut self,
        metric: &Metric<'_, G>,
        tree: &SpanningTree,
        v: VertexId,
    ) -> Result<()> {
        let choice = self.select_pivots(metric, tree, v)?;
        let points: Vec<&Point> = choice.pivots.iter().map(|u| &self.positions[u]).collect();
        let candidates = geometry::trilaterate(&points, &choice.distances)
            .ok_or_else(|| Error::degenerate(v, "pivots are coincident or affinely dependent"))?;
        let mismatch = pivot_mismatch(&candidates.above, &points, &choice.distances);
        if mismatch > INCONSISTENCY_TOLERANCE {
            return Err(Error::degenerate(
                v,
                format!(
                    "pivot distances {:?} cannot be realized against pivots {:?} (relative error {mismatch:.3})",
                    choice.distances, choice.pivots
                ),
            ));
        }

        let p = if self.minimum_distance {
            let witnesses: Vec<(&Point, f64)> = self
                .positions
                .iter()
                .filter(|(u, _)| !choice.pivots.contains(u))
                .filter_map(|(&u, pu)| metric.weight(v, u).map(|d| (pu, d)))
                .collect();
            geometry::resolve_flip(&candidates, None, &witnesses)
        } else {
            candidates.above.clone()
        };
        tracing::trace!(
            vertex = v,
            pivots = ?choice.pivots,
            height = candidates.height,
            "placed vertex"
        );

        self.boundary.record(&choice.pivots, v);
        self.positions.insert(v, p);
        self.choices.insert(v, choice);
        Ok(())
    }

    fn select_pivots<G: GraphAccess + ?Sized>(
        &self,
        metric: &Metric<'_, G>,
        tree: &SpanningTree,
        v: VertexId,
    ) -> Result<PivotChoice> {
        if self.policy == PivotPolicy::Tree {
            return self.tree_pivots(metric, tree, v);
        }
        match self.boundary_pivots(metric, v) {
            Some(choice) => Ok(choice),
            None => {
                tracing::warn!(
                    vertex = v,
                    policy = ?self.policy,
                    "no usable boundary facet; falling back to tree pivots"
                );
                self.tree_pivots(metric, tree, v)
            }
        }
    }

    /// Tree ancestors of `v` first (parent, grandparent, ...), then the nearest placed vertices.
    /// An ancestor without a stored distance is measured along the tree path. Candidates without
    /// a known distance or that would make the pivots affinely dependent are skipped.
    fn tree_pivots<G: GraphAccess + ?Sized>(
        &self,
        metric: &Metric<'_, G>,
        tree: &SpanningTree,
        v: VertexId,
    ) -> Result<PivotChoice> {
        let mut choice = PivotChoice {
            pivots: Vec::with_capacity(self.dims),
            distances: Vec::with_capacity(self.dims),
        };
        let mut hull: Option<AffineHull> = None;

        for u in tree.path_to_root(v).into_iter().skip(1) {
            if choice.pivots.len() == self.dims {
                break;
            }
            let d = metric.weight(v, u).or_else(|| tree.path_weight(v, u));
            self.try_pivot(u, d, &mut hull, &mut choice);
        }

        if choice.pivots.len() < self.dims {
            let mut nearest: Vec<(f64, VertexId)> = self
                .positions
                .keys()
                .filter(|&&u| u != v)
                .filter_map(|&u| metric.weight(v, u).map(|d| (d, u)))
                .collect();
            nearest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            for (d, u) in nearest {
                if choice.pivots.len() == self.dims {
                    break;
                }
                self.try_pivot(u, Some(d), &mut hull, &mut choice);
            }
        }

        if choice.pivots.len() < self.dims {
            return Err(Error::degenerate(
                v,
                format!(
                    "only {} of {} affinely independent pivots have a known distance",
                    choice.pivots.len(),
                    self.dims
                ),
            ));
        }
        Ok(choice)
    }

    fn try_pivot(
        &self,
        u: VertexId,
        d: Option<f64>,
        hull: &mut Option<AffineHull>,
        choice: &mut PivotChoice,
    ) {
        if choice.pivots.contains(&u) {
            return;
        }
        let (Some(p), Some(d)) = (self.positions.get(&u), d) else {
            return;
        };
        let accepted = match hull {
            None => {
                *hull = Some(AffineHull::new(p.clone()));
                true
            }
            Some(h) => h.try_extend(p, d),
        };
        if accepted {
            choice.pivots.push(u);
            choice.distances.push(d);
        }
    }

    /// Best open boundary facet for `v` under the minimum-perimeter or minimum-area policy.
    ///
    /// Area ties fall back to perimeter, and perimeter ties to the lexicographically smallest
    /// facet.
    fn boundary_pivots<G: GraphAccess + ?Sized>(
        &self,
        metric: &Metric<'_, G>,
        v: VertexId,
    ) -> Option<PivotChoice> {
        let mut best: Option<(f64, f64, PivotChoice)> = None;

        'facets: for facet in self.boundary.candidates() {
            let mut distances = Vec::with_capacity(facet.len());
            let mut points: Vec<&Point> = Vec::with_capacity(facet.len());
            for &u in facet {
                let (Some(d), Some(p)) = (metric.weight(v, u), self.positions.get(&u)) else {
                    continue 'facets;
                };
                distances.push(d);
                points.push(p);
            }
            if !affinely_independent(&points) {
                continue;
            }

            let perimeter = pivot::perimeter(&distances);
            let primary = match self.policy {
                PivotPolicy::MinimumArea => pivot::simplex_measure(&points, &distances, |i, j| {
                    metric.weight(facet[i], facet[j])
                }),
                _ => perimeter,
            };
            let better = match &best {
                None => true,
                Some((best_primary, best_perimeter, best_choice)) => {
                    compare_scores(primary, *best_primary)
                        .then(compare_scores(perimeter, *best_perimeter))
                        .then(facet.cmp(best_choice.pivots.as_slice()))
                        .is_lt()
                }
            };
            if better {
                best = Some((
                    primary,
                    perimeter,
                    PivotChoice {
                        pivots: facet.to_vec(),
                        distances,
                    },
                ));
            }
        }

        best.map(|(_, _, choice)| choice)
    }

    /// One refinement pass. Returns the largest displacement of any vertex.
    ///
    /// Each non-fixed vertex is re-trilaterated against its recorded pivots (mirror chosen nearest
    /// to its current position), averaged with the distance-projection targets of every other
    /// placed vertex with a known distance, and moved by `lambda` of the way there.
    pub(crate) fn refine_pass<G: GraphAccess + ?Sized>(
        &mut self,
        metric: &Metric<'_, G>,
        lambda: f64,
    ) -> Result<f64> {
        let snapshot = self.positions.clone();
        let mut max_shift = 0.0f64;

        for (&v, choice) in &self.choices {
            let prior = &snapshot[&v];
            let points: Vec<&Point> = choice.pivots.iter().map(|u| &snapshot[u]).collect();
            let candidates = geometry::trilaterate(&points, &choice.distances)
                .ok_or_else(|| Error::degenerate(v, "pivots collapsed during refinement"))?;

            let mut sum = if self.minimum_distance {
                geometry::resolve_flip(&candidates, Some(prior), &[])
            } else {
                candidates.above
            };
            let mut count = 1.0;
            for (&u, pu) in &snapshot {
                if u == v || choice.pivots.contains(&u) {
                    continue;
                }
                let Some(d) = metric.weight(v, u) else {
                    continue;
                };
                let dir = prior - pu;
                let len = dir.norm();
                if len <= EPSILON {
                    continue;
                }
                sum += pu + dir * (d / len);
                count += 1.0;
            }

            let target = sum / count;
            let next = prior + (target - prior) * lambda;
            max_shift = max_shift.max((&next - prior).norm());
            self.positions.insert(v, next);
        }

        Ok(max_shift)
    }
}

/// Largest pivot distance error a trilaterated vertex may carry, relative to its longest pivot
/// distance (or 1 for short ones). Noisy metrics stay well below it.
const INCONSISTENCY_TOLERANCE: f64 = 0.05;

/// Worst relative error between the distances from `p` to the pivots and the requested ones.
fn pivot_mismatch(p: &Point, pivots: &[&Point], distances: &[f64]) -> f64 {
    let scale = distances.iter().copied().fold(1.0, f64::max);
    pivots
        .iter()
        .zip(distances)
        .map(|(q, d)| ((p - *q).norm() - d).abs())
        .fold(0.0, f64::max)
        / scale
}

/// Orders two scores, treating values within round-off of each other as equal.
fn compare_scores(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0) {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

fn affinely_independent(points: &[&Point]) -> bool {
    let Some((first, rest)) = points.split_first() else {
        return false;
    };
    let mut hull = AffineHull::new((*first).clone());
    rest.iter().all(|p| hull.try_extend(p, 1.0))
}

/// Raw stress: squared mismatch between placed distances and known weights, over every placed
/// pair with a known weight.
pub(crate) fn stress<G: GraphAccess + ?Sized>(
    metric: &Metric<'_, G>,
    positions: &IndexMap<VertexId, Point>,
) -> f64 {
    let placed: Vec<(VertexId, &Point)> = positions.iter().map(|(&v, p)| (v, p)).collect();
    let mut total = 0.0;
    for (i, (a, pa)) in placed.iter().enumerate() {
        for (b, pb) in &placed[i + 1..] {
            if let Some(w) = metric.weight(*a, *b) {
                let r = (*pa - *pb).norm() - w;
                total += r * r;
            }
        }
    }
    total
}
