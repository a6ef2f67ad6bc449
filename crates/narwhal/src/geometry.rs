//! Coordinate recovery from distances.
//!
//! Everything here works on plain `nalgebra` vectors and knows nothing about graphs.

use nalgebra::{DMatrix, DVector};

pub type Point = DVector<f64>;

/// Relative tolerance below which pivots are treated as coincident or affinely dependent.
pub const EPSILON: f64 = 1e-9;

/// The two mirror-image solutions of a trilateration.
///
/// `above` is offset along the positive normal of the pivots' affine hull, `below` along the
/// negative one. They coincide when `height` is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    pub above: Point,
    pub below: Point,
    pub height: f64,
}

/// Circle-intersection construction in the plane.
///
/// Projects the unknown point onto the line `p0 -> p1` at
/// `x = (d0^2 - d1^2 + |p0p1|^2) / (2 |p0p1|)` and offsets it perpendicular to that line by
/// `h = sqrt(max(0, d0^2 - x^2))`. Returns `None` for coincident pivots.
pub fn triangulate(p0: &Point, p1: &Point, d0: f64, d1: f64) -> Option<Candidates> {
    if p0.len() != 2 || p1.len() != 2 {
        return None;
    }
    let base = p1 - p0;
    let len = base.norm();
    if !(len > EPSILON * scale(&[d0, d1])) {
        return None;
    }

    let x = (d0 * d0 - d1 * d1 + len * len) / (2.0 * len);
    let h = (d0 * d0 - x * x).max(0.0).sqrt();
    let ex = base / len;
    let ey = Point::from_vec(vec![-ex[1], ex[0]]);
    let foot = p0 + &ex * x;

    Some(Candidates {
        above: &foot + &ey * h,
        below: &foot - &ey * h,
        height: h,
    })
}

/// Solves for a point at the given distances from `pivots.len()` pivots in as many dimensions.
///
/// The pivots must be affinely independent. The solution is unique up to reflection across the
/// pivots' hyperplane; both reflections are returned. The positive normal is chosen so that the
/// hull basis followed by the normal forms a right-handed frame, which reduces to the planar
/// construction of [`triangulate`] for two pivots.
pub fn trilaterate(pivots: &[&Point], distances: &[f64]) -> Option<Candidates> {
    let m = pivots.len();
    if m < 2 || distances.len() != m {
        return None;
    }
    let dim = pivots[0].len();
    if dim != m || pivots.iter().any(|p| p.len() != dim) {
        return None;
    }
    if m == 2 {
        return triangulate(pivots[0], pivots[1], distances[0], distances[1]);
    }

    let origin = pivots[0];
    let mut hull = AffineHull::new(origin.clone());
    for p in &pivots[1..] {
        if !hull.try_extend(p, scale(distances)) {
            return None;
        }
    }

    // q_i . a = (d0^2 - d_i^2 + |q_i|^2) / 2, with q_i expressed in the hull basis (lower
    // triangular by construction).
    let k = m - 1;
    let mut lower = DMatrix::<f64>::zeros(k, k);
    let mut rhs = DVector::<f64>::zeros(k);
    for (i, p) in pivots[1..].iter().enumerate() {
        let q = *p - origin;
        for (j, e) in hull.basis.iter().enumerate() {
            lower[(i, j)] = q.dot(e);
        }
        rhs[i] = (distances[0].powi(2) - distances[i + 1].powi(2) + q.norm_squared()) / 2.0;
    }
    let a = lower.solve_lower_triangular(&rhs)?;

    let mut foot = origin.clone();
    for (j, e) in hull.basis.iter().enumerate() {
        foot += e * a[j];
    }
    let h = (distances[0].powi(2) - a.norm_squared()).max(0.0).sqrt();
    let normal = hull.oriented_normal()?;

    Some(Candidates {
        above: &foot + &normal * h,
        below: &foot - &normal * h,
        height: h,
    })
}

/// Places the `k`-th vertex (`k = placed.len()`) of the canonical starting simplex.
///
/// Vertex 0 sits at the origin, vertex 1 on the first axis, and vertex `k` in the span of the
/// first `k` axes with a non-negative `k`-th coordinate.
pub fn simplex_vertex(placed: &[Point], distances: &[f64], dim: usize) -> Option<Point> {
    let k = placed.len();
    if k >= dim || distances.len() != k {
        return None;
    }
    if k == 0 {
        return Some(Point::zeros(dim));
    }
    if k == 1 {
        let mut p = Point::zeros(dim);
        p[0] = distances[0];
        return Some(p);
    }

    let truncated: Vec<Point> = placed.iter().map(|p| p.rows(0, k).into_owned()).collect();
    let refs: Vec<&Point> = truncated.iter().collect();
    let candidates = trilaterate(&refs, distances)?;
    let local = if candidates.above[k - 1] >= candidates.below[k - 1] {
        candidates.above
    } else {
        candidates.below
    };

    let mut p = Point::zeros(dim);
    p.rows_mut(0, k).copy_from(&local);
    Some(p)
}

/// Picks one of the two mirror candidates.
///
/// With a prior position, the candidate nearer to it wins. Otherwise each witness `(point,
/// known distance)` votes through `| known - |witness - candidate| |` and the flip is affirmed when
/// the mirrored candidate's total residual is smaller. Without either, `above` is kept.
pub fn resolve_flip(
    candidates: &Candidates,
    prior: Option<&Point>,
    witnesses: &[(&Point, f64)],
) -> Point {
    if candidates.height <= EPSILON {
        return candidates.above.clone();
    }
    if let Some(prior) = prior {
        let keep = (prior - &candidates.above).norm();
        let flip = (prior - &candidates.below).norm();
        return if flip < keep {
            candidates.below.clone()
        } else {
            candidates.above.clone()
        };
    }
    if witnesses.is_empty() {
        return candidates.above.clone();
    }

    let residual = |c: &Point| -> f64 {
        witnesses
            .iter()
            .map(|(w, known)| (known - (*w - c).norm()).abs())
            .sum()
    };
    let keep = residual(&candidates.above);
    let flip = residual(&candidates.below);
    if flip + EPSILON * scale(&[keep, flip]) < keep {
        candidates.below.clone()
    } else {
        candidates.above.clone()
    }
}

/// Triangle area from its three side lengths (Heron, in Kahan's cancellation-safe form).
pub fn heron_area(a: f64, b: f64, c: f64) -> f64 {
    let mut s = [a, b, c];
    s.sort_by(|x, y| y.total_cmp(x));
    let [a, b, c] = s;
    let p = (a + (b + c)) * (c - (a - b)) * (c + (a - b)) * (a + (b - c));
    0.25 * p.max(0.0).sqrt()
}

/// Volume of the simplex whose vertices have the given pairwise distances (Cayley-Menger).
///
/// `distances` is a symmetric `(k + 1) x (k + 1)` matrix; the result is the `k`-dimensional
/// volume, clamped to zero for inconsistent inputs.
pub fn simplex_volume(distances: &DMatrix<f64>) -> f64 {
    let n = distances.nrows();
    if n < 2 || distances.ncols() != n {
        return 0.0;
    }
    let k = n - 1;
    let mut cm = DMatrix::<f64>::zeros(n + 1, n + 1);
    for i in 1..=n {
        cm[(0, i)] = 1.0;
        cm[(i, 0)] = 1.0;
        for j in 1..=n {
            cm[(i, j)] = distances[(i - 1, j - 1)].powi(2);
        }
    }
    let det = cm.determinant();
    let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
    let factorial: f64 = (1..=k).map(|i| i as f64).product();
    let denom = 2f64.powi(k as i32) * factorial * factorial;
    (sign * det / denom).max(0.0).sqrt()
}

fn scale(values: &[f64]) -> f64 {
    values.iter().fold(1.0f64, |acc, v| acc.max(v.abs()))
}

/// Incrementally built orthonormal basis of an affine hull.
#[derive(Debug, Clone)]
pub(crate) struct AffineHull {
    origin: Point,
    basis: Vec<Point>,
}

impl AffineHull {
    pub(crate) fn new(origin: Point) -> Self {
        Self {
            origin,
            basis: Vec::new(),
        }
    }

    /// Adds `p` if it is affinely independent of the points seen so far.
    pub(crate) fn try_extend(&mut self, p: &Point, scale: f64) -> bool {
        let q = p - &self.origin;
        let residual = self.residual(q);
        let norm = residual.norm();
        if !(norm > EPSILON * scale.max(1.0)) {
            return false;
        }
        self.basis.push(residual / norm);
        true
    }

    fn residual(&self, mut q: Point) -> Point {
        // Two Gram-Schmidt sweeps keep the basis orthogonal to working precision.
        for _ in 0..2 {
            for e in &self.basis {
                let c = q.dot(e);
                q -= e * c;
            }
        }
        q
    }

    /// Unit normal completing the hull basis to a right-handed frame of the ambient space.
    ///
    /// Only meaningful when the hull has exactly one dimension fewer than the ambient space.
    fn oriented_normal(&self) -> Option<Point> {
        let dim = self.origin.len();
        if self.basis.len() + 1 != dim {
            return None;
        }
        let mut normal: Option<Point> = None;
        for axis in 0..dim {
            let r = self.residual(Point::from_fn(dim, |i, _| if i == axis { 1.0 } else { 0.0 }));
            let norm = r.norm();
            if norm > 1e-6 {
                normal = Some(r / norm);
                break;
            }
        }
        let normal = normal?;

        let mut frame = DMatrix::<f64>::zeros(dim, dim);
        for (j, e) in self.basis.iter().enumerate() {
            frame.set_column(j, e);
        }
        frame.set_column(dim - 1, &normal);
        if frame.determinant() < 0.0 {
            Some(-normal)
        } else {
            Some(normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(xs: &[f64]) -> Point {
        Point::from_vec(xs.to_vec())
    }

    #[test]
    fn heron_matches_right_triangle() {
        assert!((heron_area(3.0, 4.0, 5.0) - 6.0).abs() < 1e-12);
        assert_eq!(heron_area(1.0, 2.0, 3.0), 0.0);
    }

    #[test]
    fn cayley_menger_agrees_with_heron() {
        let d = DMatrix::from_row_slice(3, 3, &[0.0, 3.0, 4.0, 3.0, 0.0, 5.0, 4.0, 5.0, 0.0]);
        assert!((simplex_volume(&d) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn cayley_menger_regular_tetrahedron() {
        let mut d = DMatrix::from_element(4, 4, 1.0);
        d.fill_diagonal(0.0);
        let expected = 1.0 / (6.0 * 2f64.sqrt());
        assert!((simplex_volume(&d) - expected).abs() < 1e-9);
    }

    #[test]
    fn affine_hull_rejects_dependent_points() {
        let mut hull = AffineHull::new(pt(&[0.0, 0.0, 0.0]));
        assert!(hull.try_extend(&pt(&[1.0, 0.0, 0.0]), 1.0));
        assert!(!hull.try_extend(&pt(&[2.0, 0.0, 0.0]), 1.0));
        assert!(hull.try_extend(&pt(&[0.0, 1.0, 0.0]), 1.0));
    }

    #[test]
    fn planar_normal_is_counter_clockwise() {
        let mut hull = AffineHull::new(pt(&[0.0, 0.0]));
        assert!(hull.try_extend(&pt(&[0.6, 0.8]), 1.0));
        let n = hull.oriented_normal().unwrap();
        assert!((n[0] + 0.8).abs() < 1e-12);
        assert!((n[1] - 0.6).abs() < 1e-12);
    }
}
