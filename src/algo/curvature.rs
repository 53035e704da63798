//! Local curvature estimation from the normal covariance tensor.
//!
//! For a vertex `v` the normals of a small breadth-first neighborhood are
//! accumulated into the symmetric tensor `A = Σ n nᵀ`. Its eigen-decomposition
//! describes the local shape:
//!
//! - on a flat patch every normal agrees, `A` has rank one and the two
//!   smaller eigenvalues vanish;
//! - along a ridge the normals fan out in one direction, so the middle
//!   eigenvalue grows;
//! - at a corner or a bump all three eigenvalues are significant.
//!
//! The eigenvalues are found analytically from the characteristic cubic and
//! the eigenvectors from rows of the adjugate of `A - λI`, which is cheap and
//! branch-light for 3×3 matrices.
//!
//! # Example
//!
//! ```
//! use omesh::mesh::primitives;
//! use omesh::algo::curvature::{local_structure, CurvatureOptions};
//!
//! let mut mesh = primitives::icosphere(1);
//! mesh.build_adjacency();
//!
//! let local = local_structure(&mesh, 0, &CurvatureOptions::default());
//! assert!(local.values[0] >= local.values[1]);
//! assert!(local.values[1] >= local.values[2]);
//! ```

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};

use crate::error::Status;
use crate::mesh::SurfaceMesh;

/// Capacity of the breadth-first visit queue.
pub const MAX_NEIGHBORHOOD: usize = 128;

/// Relative tolerance below which the tensor is treated as rank one or an
/// eigenvector as undetermined.
const EIGEN_EPS: f64 = 1e-10;

/// Options for local curvature estimation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvatureOptions {
    /// Visit three rings of neighbors instead of two.
    pub high_resolution: bool,
}

impl Default for CurvatureOptions {
    fn default() -> Self {
        Self {
            high_resolution: false,
        }
    }
}

impl CurvatureOptions {
    /// Set whether to use the three-ring neighborhood.
    pub fn with_high_resolution(mut self, high_resolution: bool) -> Self {
        self.high_resolution = high_resolution;
        self
    }

    /// Number of rings visited around the vertex.
    #[inline]
    pub fn rings(&self) -> usize {
        if self.high_resolution {
            3
        } else {
            2
        }
    }
}

/// Eigen-decomposition of a vertex's normal tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalStructure {
    /// Eigenvalues in descending order.
    pub values: Vector3<f64>,
    /// Unit eigenvectors as columns, matching `values`; right-handed.
    pub vectors: Matrix3<f64>,
    /// Largest angle (degrees) between the vertex normal and any visited normal.
    pub max_deviation: f64,
    /// `Ok`, or `DegenerateEigenFallback` when the identity basis was used.
    pub status: Status,
}

impl LocalStructure {
    fn fallback(trace: f64, max_deviation: f64) -> Self {
        Self {
            values: Vector3::new(trace, 0.0, 0.0),
            vectors: Matrix3::identity(),
            max_deviation,
            status: Status::DegenerateEigenFallback,
        }
    }

    /// Whether the decomposition fell back to the default basis.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.status == Status::DegenerateEigenFallback
    }

    /// The `i`-th eigenvector.
    #[inline]
    pub fn eigenvector(&self, i: usize) -> Vector3<f64> {
        self.vectors.column(i).into_owned()
    }

    /// `|λ₂ / λ₁|`, or `None` if the largest eigenvalue vanishes.
    pub fn flatness(&self) -> Option<f64> {
        if self.values[0].abs() <= f64::EPSILON {
            None
        } else {
            Some((self.values[1] / self.values[0]).abs())
        }
    }
}

/// Unit normal at `v` from its fan.
///
/// Each fan entry `(a, b)` contributes the normalized `(a - v) × (b - v)`,
/// which points outward for counter-clockwise faces. Returns `None` without
/// an adjacency or when the contributions cancel.
pub fn vertex_normal(mesh: &SurfaceMesh, v: usize) -> Option<Vector3<f64>> {
    let fan = mesh.fan(v)?;
    let p = mesh.position(v);

    let mut sum = Vector3::zeros();
    for e in fan.entries() {
        let n = (mesh.position(e.a) - p).cross(&(mesh.position(e.b) - p));
        let len = n.norm();
        if len > f64::EPSILON {
            sum += n / len;
        }
    }

    let len = sum.norm();
    if len > f64::EPSILON {
        Some(sum / len)
    } else {
        None
    }
}

/// Accumulate the normal tensor over a breadth-first neighborhood of `v`
/// and decompose it.
///
/// No vertex is visited twice and at most [`MAX_NEIGHBORHOOD`] vertices are
/// visited. Vertices without a usable normal are traversed but contribute
/// nothing.
pub fn local_structure(mesh: &SurfaceMesh, v: usize, options: &CurvatureOptions) -> LocalStructure {
    let Some(adjacency) = mesh.adjacency() else {
        return LocalStructure::fallback(0.0, 0.0);
    };
    let Some(center) = vertex_normal(mesh, v) else {
        return LocalStructure::fallback(0.0, 0.0);
    };

    let rings = options.rings();
    let mut tensor = center * center.transpose();
    let mut max_deviation: f64 = 0.0;

    let mut queue: Vec<(usize, usize)> = Vec::with_capacity(MAX_NEIGHBORHOOD);
    queue.push((v, 0));
    let mut head = 0;

    'visit: while head < queue.len() {
        let (u, depth) = queue[head];
        head += 1;
        if depth >= rings {
            continue;
        }
        for w in adjacency.fan(u).neighbors() {
            if queue.len() >= MAX_NEIGHBORHOOD {
                break 'visit;
            }
            if queue.iter().any(|&(x, _)| x == w) {
                continue;
            }
            queue.push((w, depth + 1));

            if let Some(n) = vertex_normal(mesh, w) {
                tensor += n * n.transpose();
                let angle = center.dot(&n).clamp(-1.0, 1.0).acos().to_degrees();
                max_deviation = max_deviation.max(angle);
            }
        }
    }

    let (values, vectors, status) = symmetric_eigen(&tensor);
    LocalStructure {
        values,
        vectors,
        max_deviation,
        status,
    }
}

/// Analytic eigen-decomposition of a symmetric 3×3 matrix.
///
/// Returns eigenvalues in descending order, unit eigenvectors as matching
/// columns (the third is the cross product of the first two), and a status.
/// NaN roots, a rank-one matrix, or a basis that cannot be recovered yield
/// `(trace, 0, 0)` with the identity basis and
/// [`Status::DegenerateEigenFallback`].
pub fn symmetric_eigen(m: &Matrix3<f64>) -> (Vector3<f64>, Matrix3<f64>, Status) {
    let trace = m.trace();
    let fallback = (
        Vector3::new(trace, 0.0, 0.0),
        Matrix3::identity(),
        Status::DegenerateEigenFallback,
    );

    // Characteristic polynomial λ³ + aλ² + bλ + c.
    let minors = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
        + m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)]
        + m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)];
    let a = -trace;
    let b = minors;
    let c = -m.determinant();

    // Identical normals give a rank-one tensor with a double root at zero.
    if minors.abs() <= EIGEN_EPS * trace * trace {
        return fallback;
    }

    let q = (a * a - 3.0 * b) / 9.0;
    let r = (2.0 * a * a * a - 9.0 * a * b + 27.0 * c) / 54.0;
    // Rounding can push a double root just past the discriminant boundary.
    let theta = (r / (q * q * q).sqrt()).clamp(-1.0, 1.0).acos();
    let scale = -2.0 * q.sqrt();
    let shift = a / 3.0;

    let mut roots = [
        scale * (theta / 3.0).cos() - shift,
        scale * ((theta + 2.0 * PI) / 3.0).cos() - shift,
        scale * ((theta - 2.0 * PI) / 3.0).cos() - shift,
    ];
    if roots.iter().any(|x| x.is_nan()) {
        return fallback;
    }
    roots.sort_by(|x, y| y.total_cmp(x));

    let tol = EIGEN_EPS * trace.abs().max(f64::MIN_POSITIVE).powi(2);
    let e = roots.map(|lambda| adjugate_eigenvector(m, lambda, tol));

    let (e0, e1) = match (e[0], e[1], e[2]) {
        (Some(e0), Some(e1), _) => (e0, orthonormalize(e1, &e0)),
        (Some(e0), None, _) => (e0, any_orthogonal(&e0)),
        (None, _, Some(e2)) => {
            let e0 = any_orthogonal(&e2);
            (e0, e2.cross(&e0))
        }
        _ => return fallback,
    };
    let e2 = e0.cross(&e1);

    (
        Vector3::new(roots[0], roots[1], roots[2]),
        Matrix3::from_columns(&[e0, e1, e2]),
        Status::Ok,
    )
}

/// Eigenvector for `lambda` from the largest-norm cross product of two rows
/// of `m - λI` (a column of its adjugate).
fn adjugate_eigenvector(m: &Matrix3<f64>, lambda: f64, tol: f64) -> Option<Vector3<f64>> {
    let shifted = m - Matrix3::identity() * lambda;
    let r0 = shifted.row(0).transpose();
    let r1 = shifted.row(1).transpose();
    let r2 = shifted.row(2).transpose();

    let best = [r0.cross(&r1), r0.cross(&r2), r1.cross(&r2)]
        .into_iter()
        .max_by(|x, y| x.norm_squared().total_cmp(&y.norm_squared()))?;
    let len = best.norm();
    if len <= tol || !len.is_finite() {
        None
    } else {
        Some(best / len)
    }
}

fn orthonormalize(v: Vector3<f64>, against: &Vector3<f64>) -> Vector3<f64> {
    let w = v - against * against.dot(&v);
    let len = w.norm();
    if len > f64::EPSILON {
        w / len
    } else {
        any_orthogonal(against)
    }
}

fn any_orthogonal(v: &Vector3<f64>) -> Vector3<f64> {
    let axis = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&axis).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    fn assert_decomposes(m: &Matrix3<f64>) {
        let (values, vectors, status) = symmetric_eigen(m);
        assert_eq!(status, Status::Ok);
        assert!(values[0] >= values[1] && values[1] >= values[2]);
        for i in 0..3 {
            let e = vectors.column(i).into_owned();
            assert!((e.norm() - 1.0).abs() < 1e-9);
            let residual = (m * e - e * values[i]).norm();
            assert!(residual < 1e-8, "residual {residual} for eigenpair {i}");
        }
        assert!((vectors.determinant() - 1.0).abs() < 1e-9, "basis must be right-handed");
    }

    #[test]
    fn test_diagonal_matrix() {
        let m = Matrix3::from_diagonal(&Vector3::new(1.0, 3.0, 2.0));
        let (values, vectors, _) = symmetric_eigen(&m);
        assert!((values - Vector3::new(3.0, 2.0, 1.0)).norm() < 1e-9);
        assert!((vectors.column(0).dot(&Vector3::y()).abs() - 1.0).abs() < 1e-9);
        assert_decomposes(&m);
    }

    #[test]
    fn test_matches_numeric_solver() {
        let m = Matrix3::new(4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 1.5);
        assert_decomposes(&m);

        let (values, _, _) = symmetric_eigen(&m);
        let mut expected: Vec<f64> = m.symmetric_eigen().eigenvalues.iter().copied().collect();
        expected.sort_by(|x, y| y.total_cmp(x));
        for i in 0..3 {
            assert!((values[i] - expected[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_repeated_minor_eigenvalues() {
        // A cone apex: one dominant direction, two equal minor ones.
        let m = Matrix3::from_diagonal(&Vector3::new(0.5, 0.5, 6.0));
        assert_decomposes(&m);
        let (values, vectors, _) = symmetric_eigen(&m);
        assert!((values[0] - 6.0).abs() < 1e-9);
        assert!((vectors.column(0).into_owned().z.abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_normals_fall_back() {
        let n = Vector3::new(1.0, 2.0, 2.0) / 3.0;
        let m = n * n.transpose() * 7.0;
        let (values, vectors, status) = symmetric_eigen(&m);

        assert_eq!(status, Status::DegenerateEigenFallback);
        assert!((values[0] - 7.0).abs() < 1e-9);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 0.0);
        assert_eq!(vectors, Matrix3::identity());
    }

    #[test]
    fn test_zero_matrix_falls_back() {
        let (values, vectors, status) = symmetric_eigen(&Matrix3::zeros());
        assert_eq!(status, Status::DegenerateEigenFallback);
        assert!(!values.iter().any(|x| x.is_nan()));
        assert_eq!(vectors, Matrix3::identity());
    }

    #[test]
    fn test_vertex_normal_on_sphere() {
        let mut mesh = primitives::icosahedron();
        mesh.build_adjacency();
        for v in 0..mesh.num_vertices() {
            let n = vertex_normal(&mesh, v).unwrap();
            let radial = mesh.position(v).coords.normalize();
            assert!((n - radial).norm() < 1e-9);
        }
    }

    #[test]
    fn test_vertex_normal_without_adjacency() {
        let mesh = primitives::icosahedron();
        assert!(vertex_normal(&mesh, 0).is_none());
    }

    #[test]
    fn test_planar_neighborhood_is_degenerate() {
        let mut mesh = primitives::grid(6);
        mesh.build_adjacency();

        // Vertex (3, 3) sits well inside the grid.
        let local = local_structure(&mesh, 3 * 7 + 3, &CurvatureOptions::default());
        assert!(local.is_degenerate());
        assert!(local.values[0] > 1.0);
        assert_eq!(local.values[1], 0.0);
        assert_eq!(local.vectors, Matrix3::identity());
        assert_eq!(local.max_deviation, 0.0);
        assert_eq!(local.flatness(), Some(0.0));
    }

    #[test]
    fn test_sphere_neighborhood() {
        let mut mesh = primitives::icosphere(2);
        mesh.build_adjacency();

        let local = local_structure(&mesh, 0, &CurvatureOptions::default());
        assert_eq!(local.status, Status::Ok);
        assert!(local.max_deviation > 0.0);

        // The dominant direction is the surface normal.
        let radial = mesh.position(0).coords.normalize();
        assert!(local.eigenvector(0).dot(&radial).abs() > 0.99);
        let flat = local.flatness().unwrap();
        assert!(flat > 0.0 && flat < 0.5);
    }

    #[test]
    fn test_high_resolution_visits_more() {
        let mut mesh = primitives::icosphere(2);
        mesh.build_adjacency();

        let two = local_structure(&mesh, 0, &CurvatureOptions::default());
        let three = local_structure(&mesh, 0, &CurvatureOptions::default().with_high_resolution(true));
        // More unit normals accumulate into the trace.
        assert!(three.values.sum() > two.values.sum());
        assert!(three.max_deviation >= two.max_deviation);
    }
}
