//! End-to-end optimization scenarios.

use nalgebra::Point3;
use omesh::algo::quality::angle_statistics;
use omesh::mesh::primitives;
use omesh::prelude::*;

#[test]
fn icosahedron_refines_to_42_vertices() {
    let mut mesh = primitives::icosahedron();
    let original = mesh.clone();
    mesh.refine();

    assert_eq!(mesh.num_vertices(), 42);
    assert_eq!(mesh.num_faces(), 80);

    // Every new vertex sits exactly on the midpoint of an original edge.
    for v in 12..mesh.num_vertices() {
        let p = *mesh.position(v);
        let parent = original.faces().iter().any(|f| {
            let [a, b, c] = f.vertices;
            [(a, b), (b, c), (c, a)].iter().any(|&(u, w)| {
                let m = (original.position(u).coords + original.position(w).coords) * 0.5;
                Point3::from(m) == p
            })
        });
        assert!(parent, "vertex {v} is not an edge midpoint");
    }
}

#[test]
fn flat_quad_flips_its_diagonal() {
    let mut mesh = primitives::flat_quad();
    let before = angle_statistics(&mesh, 15.0, 150.0).min;

    mesh.smooth(15.0, 150.0, 1, false, false);

    let after = angle_statistics(&mesh, 15.0, 150.0).min;
    assert!(after > before);
    let diagonal = mesh.faces().iter().all(|f| f.contains(1) && f.contains(3));
    assert!(diagonal, "faces: {:?}", mesh.faces());
}

#[test]
fn default_recipe_on_dense_plane() {
    let mut mesh = primitives::grid(10);
    mesh.refine();
    let before = mesh.num_vertices();

    let converged = mesh.optimize_using_default_parameters().unwrap();
    let stats = angle_statistics(&mesh, 15.0, 150.0);

    assert!(mesh.num_vertices() < before);
    assert_eq!(converged, stats.within(15.0, 150.0));
    assert!(mesh.adjacency().unwrap().is_consistent(mesh.faces()));
    for f in 0..mesh.num_faces() {
        assert!(mesh.face_normal(f).z > 0.0, "face {f} folded over");
    }
}

#[test]
fn default_recipe_on_sphere() {
    // Neighborhoods on a level-3 sphere are flat enough to coarsen.
    let mut mesh = primitives::icosphere(3);
    let converged = mesh.optimize_using_default_parameters().unwrap();

    assert!(mesh.num_vertices() < 642);
    assert_eq!(mesh.num_faces(), 2 * mesh.num_vertices() - 4);
    assert_eq!(converged, angle_statistics(&mesh, 15.0, 150.0).within(15.0, 150.0));
    assert!(mesh.adjacency().unwrap().is_consistent(mesh.faces()));
}

#[test]
fn dense_then_smooth() {
    let mut mesh = primitives::icosphere(3);
    let report = mesh.coarse_dense(2.0, 3, false).unwrap();
    assert!(report.removed > 0);
    assert!(report.passes >= 1);

    let stats_before = angle_statistics(&mesh, 20.0, 140.0);
    mesh.smooth(20.0, 140.0, 10, true, false);
    let stats_after = angle_statistics(&mesh, 20.0, 140.0);
    assert!(stats_after.min >= stats_before.min - 1e-9);
}

#[test]
fn flat_buffer_round_trip_after_optimization() {
    let mut mesh = primitives::grid(6);
    mesh.coarse_flat(0.05, 2, false).unwrap();

    let (positions, indices) = mesh.to_flat_buffers();
    let rebuilt = SurfaceMesh::from_buffers(&positions, &indices).unwrap();
    assert_eq!(rebuilt.num_vertices(), mesh.num_vertices());
    assert_eq!(rebuilt.faces().len(), mesh.faces().len());
    for (lhs, rhs) in rebuilt.faces().iter().zip(mesh.faces()) {
        assert_eq!(lhs.vertices, rhs.vertices);
    }
}

#[test]
fn transforms_commute_with_refinement() {
    let mut a = primitives::tetrahedron();
    a.translate(1.0, 2.0, 3.0);
    a.scale_uniform(2.0);
    a.refine();

    let mut b = primitives::tetrahedron();
    b.refine();
    b.translate(1.0, 2.0, 3.0);
    b.scale_uniform(2.0);

    for v in 0..a.num_vertices() {
        assert!((a.position(v) - b.position(v)).norm() < 1e-12);
    }
}

#[test]
fn coarsening_an_empty_mesh_fails() {
    let mut mesh = SurfaceMesh::with_size(4, 0);
    assert_eq!(mesh.coarse(0.1, 1.0, 0.0, None, false), Err(MeshError::EmptyMesh));
}

#[test]
fn bowtie_stays_flagged_after_refinement() {
    // Two tetrahedra sharing vertex 0.
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let triangles = vec![
        [0, 2, 1],
        [0, 1, 3],
        [0, 3, 2],
        [1, 2, 3],
        [0, 4, 5],
        [0, 6, 4],
        [0, 5, 6],
        [4, 6, 5],
    ];
    let mut mesh = SurfaceMesh::from_triangles(&positions, &triangles).unwrap();
    assert_eq!(mesh.build_adjacency().broken_fans, vec![0]);

    mesh.refine();
    assert_eq!(mesh.smooth_normals(15.0, 150.0, false), Status::NonManifoldSkipped);
    assert_eq!(mesh.smooth_normals(15.0, 150.0, false), Status::NonManifoldSkipped);
}
