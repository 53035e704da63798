//! Benchmarks for mesh operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector3};
use omesh::algo::curvature::{local_structure, CurvatureOptions};
use omesh::algo::decimate::{coarsen, CoarsenOptions};
use omesh::algo::quality::angle_statistics;
use omesh::algo::smooth::{smooth, SmoothOptions};
use omesh::mesh::primitives;
use omesh::prelude::*;

/// Icosphere with a deterministic radial wobble so smoothing has work to do.
fn create_bumpy_sphere(subdivisions: usize) -> SurfaceMesh {
    let mut mesh = primitives::icosphere(subdivisions);
    for (i, v) in mesh.vertices_mut().iter_mut().enumerate() {
        let t = i as f64;
        let offset = Vector3::new((t * 12.9898).sin(), (t * 78.233).sin(), (t * 37.719).sin());
        v.position += offset * 0.01;
    }
    mesh
}

fn bench_mesh_construction(c: &mut Criterion) {
    let n = 50;
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
            let v01 = v00 + (n + 1);
            triangles.push([v00, v00 + 1, v01 + 1]);
            triangles.push([v00, v01 + 1, v01]);
        }
    }

    c.bench_function("from_triangles_grid_50x50", |b| {
        b.iter(|| SurfaceMesh::from_triangles(black_box(&positions), black_box(&triangles)).unwrap())
    });
}

fn bench_adjacency(c: &mut Criterion) {
    let mesh = primitives::icosphere(4);

    c.bench_function("build_adjacency_icosphere4", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            m.build_adjacency();
            m
        })
    });
}

fn bench_curvature(c: &mut Criterion) {
    let mut mesh = primitives::icosphere(3);
    mesh.build_adjacency();
    let options = CurvatureOptions::default();

    c.bench_function("local_structure_all_icosphere3", |b| {
        b.iter(|| {
            (0..mesh.num_vertices())
                .map(|v| local_structure(&mesh, v, &options).values[1])
                .sum::<f64>()
        })
    });
}

fn bench_refine(c: &mut Criterion) {
    let mesh = primitives::icosphere(3);

    c.bench_function("refine_icosphere3", |b| b.iter(|| refine(black_box(&mesh))));
}

fn bench_smooth(c: &mut Criterion) {
    let mesh = create_bumpy_sphere(3);
    let options = SmoothOptions::default().with_angles(30.0, 110.0).with_max_iterations(3);

    c.bench_function("smooth_3_iterations_icosphere3", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            smooth(&mut m, &options)
        })
    });
}

fn bench_coarsen(c: &mut Criterion) {
    let mesh = primitives::grid(40);
    let options = CoarsenOptions::flat(0.05);

    c.bench_function("coarsen_flat_grid_40x40", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            coarsen(&mut m, &options).unwrap()
        })
    });
}

fn bench_quality(c: &mut Criterion) {
    let mesh = primitives::icosphere(4);

    c.bench_function("angle_statistics_icosphere4", |b| {
        b.iter(|| angle_statistics(black_box(&mesh), 15.0, 150.0))
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_adjacency,
    bench_curvature,
    bench_refine,
    bench_smooth,
    bench_coarsen,
    bench_quality,
);
criterion_main!(benches);
