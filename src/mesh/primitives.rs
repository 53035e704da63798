//! Small reference surfaces.
//!
//! Useful as fixtures and benchmark inputs. All faces are wound
//! counter-clockwise when seen from outside.

use nalgebra::Point3;

use super::surface::{Face, SurfaceMesh, Vertex};

fn assemble(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> SurfaceMesh {
    let mut mesh = SurfaceMesh::new();
    mesh.vertices = positions.iter().map(|&p| Vertex::new(p)).collect();
    mesh.faces = triangles.iter().map(|&t| Face::new(t)).collect();
    mesh
}

/// A closed tetrahedron with 4 vertices and 4 faces.
pub fn tetrahedron() -> SurfaceMesh {
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    let triangles = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    assemble(&positions, &triangles)
}

/// A unit icosahedron (12 vertices, 20 faces) inscribed in the unit sphere.
pub fn icosahedron() -> SurfaceMesh {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let s = 1.0 / (1.0 + phi * phi).sqrt();

    let positions = [
        Point3::new(-1.0, phi, 0.0) * s,
        Point3::new(1.0, phi, 0.0) * s,
        Point3::new(-1.0, -phi, 0.0) * s,
        Point3::new(1.0, -phi, 0.0) * s,
        Point3::new(0.0, -1.0, phi) * s,
        Point3::new(0.0, 1.0, phi) * s,
        Point3::new(0.0, -1.0, -phi) * s,
        Point3::new(0.0, 1.0, -phi) * s,
        Point3::new(phi, 0.0, -1.0) * s,
        Point3::new(phi, 0.0, 1.0) * s,
        Point3::new(-phi, 0.0, -1.0) * s,
        Point3::new(-phi, 0.0, 1.0) * s,
    ];

    let triangles = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    assemble(&positions, &triangles)
}

/// An icosahedron refined `subdivisions` times with every vertex pushed
/// back onto the unit sphere.
pub fn icosphere(subdivisions: usize) -> SurfaceMesh {
    let mut mesh = icosahedron();
    for _ in 0..subdivisions {
        mesh = crate::algo::subdivide::refine(&mesh);
        for v in mesh.vertices.iter_mut() {
            v.position = Point3::from(v.position.coords.normalize());
        }
    }
    mesh.adjacency = None;
    mesh
}

/// A flat `n × n` grid of unit squares in the z = 0 plane, two triangles
/// per square.
///
/// Vertex `(i, j)` has index `j * (n + 1) + i`.
pub fn grid(n: usize) -> SurfaceMesh {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    let mut triangles = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    assemble(&positions, &triangles)
}

/// A flat rhombus split along its long diagonal (vertices 0 and 2).
///
/// The two triangles are needle-shaped; flipping to the short diagonal
/// (1–3) raises the minimum angle from about 14° to about 28°.
pub fn flat_quad() -> SurfaceMesh {
    let positions = [
        Point3::new(-2.0, 0.0, 0.0),
        Point3::new(0.0, -0.5, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 0.5, 0.0),
    ];
    let triangles = [[0, 1, 2], [0, 2, 3]];
    assemble(&positions, &triangles)
}
