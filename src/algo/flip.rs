//! Edge flips around a vertex.
//!
//! The edge `v–w` shared by two consecutive fan faces `(v, p, w)` and
//! `(v, w, q)` is replaced by the other diagonal of the quad, `p–q`, giving
//! `(v, p, q)` and `(w, q, p)`. A flip is applied only when it is legal
//! (the surface stays a simple triangulation) and strictly raises the
//! smallest angle of the pair.

use nalgebra::Vector3;

use super::quality::triangle_min_angle;
use crate::mesh::{FanShape, SurfaceMesh};

/// Cosine of the largest dihedral bend (about 30°) a flip may cross when
/// ridges are preserved.
pub const RIDGE_COS: f64 = 0.866;

/// Minimum improvement, in degrees, for a flip to count as better.
const MIN_GAIN: f64 = 1e-9;

/// A candidate flip of the edge `v–w`.
#[derive(Debug, Clone, Copy)]
struct Quad {
    v: usize,
    p: usize,
    w: usize,
    q: usize,
    /// Face `(v, p, w)`.
    left: usize,
    /// Face `(v, w, q)`.
    right: usize,
}

fn raw_normal(mesh: &SurfaceMesh, a: usize, b: usize, c: usize) -> Vector3<f64> {
    let pa = mesh.position(a);
    (mesh.position(b) - pa).cross(&(mesh.position(c) - pa))
}

fn min_angle(mesh: &SurfaceMesh, a: usize, b: usize, c: usize) -> f64 {
    triangle_min_angle(mesh.position(a), mesh.position(b), mesh.position(c))
}

fn unit_cos(n1: &Vector3<f64>, n2: &Vector3<f64>) -> f64 {
    let len = n1.norm() * n2.norm();
    if len <= f64::EPSILON {
        -1.0
    } else {
        n1.dot(n2) / len
    }
}

fn min_valence(shape: FanShape) -> usize {
    if shape == FanShape::Closed {
        3
    } else {
        2
    }
}

/// Whether the quad can be re-triangulated without breaking the surface.
fn is_legal(mesh: &SurfaceMesh, quad: &Quad) -> bool {
    let Some(adjacency) = mesh.adjacency() else {
        return false;
    };
    let Quad { v, p, w, q, .. } = *quad;
    if p == q || p == w || q == w {
        return false;
    }

    let fans = [adjacency.fan(v), adjacency.fan(p), adjacency.fan(w), adjacency.fan(q)];
    if fans.iter().any(|fan| !fan.is_ordered()) {
        return false;
    }
    if fans[1].has_neighbor(q) {
        return false;
    }

    // v and w each lose one neighbor.
    [fans[0], fans[2]]
        .iter()
        .all(|fan| fan.valence() > min_valence(fan.shape()))
}

/// Whether flipping the quad is an improvement worth applying.
fn is_better(mesh: &SurfaceMesh, quad: &Quad, preserve_ridges: bool) -> bool {
    let Quad { v, p, w, q, .. } = *quad;

    let old_left = raw_normal(mesh, v, p, w);
    let old_right = raw_normal(mesh, v, w, q);
    let new_left = raw_normal(mesh, v, p, q);
    let new_right = raw_normal(mesh, w, q, p);

    let reference = old_left + old_right;
    if new_left.dot(&reference) <= 0.0 || new_right.dot(&reference) <= 0.0 {
        return false;
    }

    if preserve_ridges
        && (unit_cos(&old_left, &old_right) <= RIDGE_COS
            || unit_cos(&new_left, &new_right) <= RIDGE_COS)
    {
        return false;
    }

    let before = min_angle(mesh, v, p, w).min(min_angle(mesh, v, w, q));
    let after = min_angle(mesh, v, p, q).min(min_angle(mesh, w, q, p));
    after > before + MIN_GAIN
}

/// Rewrite the two faces and rebuild the four affected fans.
fn apply(mesh: &mut SurfaceMesh, quad: &Quad) {
    let Quad {
        v,
        p,
        w,
        q,
        left,
        right,
    } = *quad;

    mesh.faces[left].vertices = [v, p, q];
    mesh.faces[right].vertices = [w, q, p];

    let Some(adjacency) = mesh.adjacency.as_mut() else {
        return;
    };
    for u in [v, p, w, q] {
        let mut candidates: Vec<usize> = adjacency.fan(u).faces().collect();
        candidates.push(left);
        candidates.push(right);
        adjacency.refan(&mesh.faces, u, &candidates);
    }
}

/// Find the first flip around `v` that is legal and improving.
fn find_flip(mesh: &SurfaceMesh, v: usize, preserve_ridges: bool) -> Option<Quad> {
    let fan = mesh.fan(v)?;
    let entries = fan.entries();
    let n = entries.len();

    // In an open fan the first and last spokes are boundary edges.
    let spokes = match fan.shape() {
        FanShape::Closed => 0..n,
        FanShape::Open => 1..n,
        _ => return None,
    };

    spokes
        .map(|i| {
            let prev = entries[(i + n - 1) % n];
            let cur = entries[i];
            Quad {
                v,
                p: prev.a,
                w: cur.a,
                q: cur.b,
                left: prev.face,
                right: cur.face,
            }
        })
        .find(|quad| is_legal(mesh, quad) && is_better(mesh, quad, preserve_ridges))
}

/// Flip every improving edge incident to `v`.
///
/// After each flip the fan of `v` is re-read, so flips can cascade. At most
/// four flips per incident face are made. Returns the number of flips.
pub fn flip_edges_around(mesh: &mut SurfaceMesh, v: usize, preserve_ridges: bool) -> usize {
    let budget = match mesh.fan(v) {
        Some(fan) if fan.is_ordered() => 4 * fan.len(),
        _ => return 0,
    };

    let mut flips = 0;
    while flips < budget {
        let Some(quad) = find_flip(mesh, v, preserve_ridges) else {
            break;
        };
        apply(mesh, &quad);
        flips += 1;
    }
    flips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::quality::angle_statistics;
    use crate::mesh::primitives;

    #[test]
    fn test_flat_quad_flips_short_diagonal() {
        let mut mesh = primitives::flat_quad();
        mesh.build_adjacency();
        let before = angle_statistics(&mesh, 0.0, 180.0).min;

        let flips = flip_edges_around(&mut mesh, 0, false);
        assert_eq!(flips, 1);
        assert_eq!(mesh.face(0).vertices, [0, 1, 3]);
        assert_eq!(mesh.face(1).vertices, [2, 3, 1]);

        let after = angle_statistics(&mesh, 0.0, 180.0).min;
        assert!(after > before + 10.0, "{before} -> {after}");
        assert!(mesh.adjacency().unwrap().is_consistent(mesh.faces()));
    }

    #[test]
    fn test_flat_quad_flip_is_stable() {
        let mut mesh = primitives::flat_quad();
        mesh.build_adjacency();
        flip_edges_around(&mut mesh, 0, false);
        for v in 0..4 {
            assert_eq!(flip_edges_around(&mut mesh, v, false), 0, "vertex {v}");
        }
    }

    #[test]
    fn test_delaunay_grid_has_no_flips() {
        let mut mesh = primitives::grid(3);
        mesh.build_adjacency();
        // Both diagonals of a unit square give 45° minimum angles.
        for v in 0..mesh.num_vertices() {
            assert_eq!(flip_edges_around(&mut mesh, v, false), 0);
        }
    }

    #[test]
    fn test_tetrahedron_valence_blocks_flip() {
        let mut mesh = primitives::tetrahedron();
        mesh.build_adjacency();
        for v in 0..4 {
            assert_eq!(flip_edges_around(&mut mesh, v, false), 0);
        }
    }

    #[test]
    fn test_ridge_blocks_flip() {
        let mut mesh = primitives::flat_quad();
        // Fold the quad 60° along the long diagonal.
        mesh.set_position(3, nalgebra::Point3::new(0.0, 0.25, 0.433));
        mesh.build_adjacency();
        assert_eq!(flip_edges_around(&mut mesh, 0, true), 0);
    }

    #[test]
    fn test_unbuilt_adjacency_is_noop() {
        let mut mesh = primitives::flat_quad();
        assert_eq!(flip_edges_around(&mut mesh, 0, false), 0);
    }
}
