//! Vertex-removal coarsening.

use log::debug;
use nalgebra::Vector3;

use super::polygon::subdivide_polygon;
use super::{CoarsenOptions, CoarsenReport};
use crate::algo::curvature::{local_structure, CurvatureOptions};
use crate::algo::smooth::relocate_vertex;
use crate::algo::{log_pass, Progress};
use crate::error::{MeshError, Result, Status};
use crate::mesh::SurfaceMesh;

/// Whether removing `v` keeps its neighborhood a simple triangulation.
fn is_eligible(mesh: &SurfaceMesh, v: usize, options: &CoarsenOptions) -> bool {
    let Some(adjacency) = mesh.adjacency() else {
        return false;
    };
    let fan = adjacency.fan(v);
    if !fan.is_closed() {
        return false;
    }

    let ring = fan.neighbors();
    ring.iter().all(|&w| {
        let neighbor = adjacency.fan(w);
        let shared = neighbor
            .neighbors()
            .iter()
            .filter(|&&u| u != v && ring.contains(&u))
            .count();
        shared <= options.shared_neighbor_limit && neighbor.valence() > options.min_neighbor_valence
    })
}

/// `ratio1 · ratio2` for `v`, or `None` if the vertex must be kept.
fn removal_score(
    mesh: &SurfaceMesh,
    v: usize,
    options: &CoarsenOptions,
    average_edge: f64,
    report: &mut CoarsenReport,
) -> Option<f64> {
    let local = local_structure(mesh, v, &options.curvature);
    if local.is_degenerate() {
        report.degenerate += 1;
        report.status = report.status.merge(Status::DegenerateEigenFallback);
    }

    if let Some(limit) = options.max_normal_angle {
        if local.max_deviation > limit {
            return None;
        }
    }

    let ratio1 = if options.flatness_rate == 0.0 {
        1.0
    } else {
        local.flatness()?.powf(options.flatness_rate)
    };

    let ratio2 = if options.denseness_weight == 0.0 || average_edge <= f64::EPSILON {
        1.0
    } else {
        let fan = mesh.fan(v)?;
        let longest = fan
            .neighbors()
            .into_iter()
            .map(|w| mesh.edge_length(v, w))
            .fold(0.0, f64::max);
        (longest / average_edge).powf(options.denseness_weight)
    };

    Some(ratio1 * ratio2)
}

fn raw_normal(mesh: &SurfaceMesh, [a, b, c]: [usize; 3]) -> Vector3<f64> {
    let pa = mesh.position(a);
    (mesh.position(b) - pa).cross(&(mesh.position(c) - pa))
}

/// Remove `v` and fill its star with `d - 2` new faces.
///
/// The new faces take over the first star slots; the last two slots are
/// flagged in `removed_faces`. Returns `false`, leaving the mesh untouched,
/// if the hole cannot be triangulated without folding.
fn remove_vertex(
    mesh: &mut SurfaceMesh,
    v: usize,
    removed_faces: &mut [bool],
    curvature: &CurvatureOptions,
) -> bool {
    let Some(adjacency) = mesh.adjacency() else {
        return false;
    };
    let fan = adjacency.fan(v);
    let ring = fan.neighbors();
    let star: Vec<usize> = fan.faces().collect();

    let Some(triangles) = subdivide_polygon(
        &ring,
        |w| adjacency.fan(w).valence() - 1,
        |a, b| adjacency.fan(a).has_neighbor(b),
    ) else {
        return false;
    };

    // The new faces must face the same way as the star they replace.
    let reference: Vector3<f64> = star.iter().map(|&f| raw_normal(mesh, mesh.face(f).vertices)).sum();
    if triangles.iter().any(|&tri| raw_normal(mesh, tri).dot(&reference) <= 0.0) {
        return false;
    }

    for (&slot, &tri) in star.iter().zip(&triangles) {
        mesh.faces[slot].vertices = tri;
    }
    for &slot in &star[triangles.len()..] {
        removed_faces[slot] = true;
    }

    let Some(adjacency) = mesh.adjacency.as_mut() else {
        return false;
    };
    for &w in &ring {
        let candidates: Vec<usize> = adjacency
            .fan(w)
            .faces()
            .chain(star.iter().copied())
            .filter(|&f| !removed_faces[f])
            .collect();
        adjacency.refan(&mesh.faces, w, &candidates);
    }
    adjacency.clear_fan(v);

    // Smooth out the spike the retriangulation may leave.
    for &w in &ring {
        if mesh.vertex(w).selected {
            relocate_vertex(mesh, w, curvature);
        }
    }
    true
}

pub(super) fn coarsen_pass(
    mesh: &mut SurfaceMesh,
    options: &CoarsenOptions,
    progress: &Progress,
) -> Result<CoarsenReport> {
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }
    options.validate()?;

    let mut report = CoarsenReport {
        vertices_before: mesh.num_vertices(),
        status: mesh.ensure_adjacency(),
        ..Default::default()
    };

    let average_edge = mesh.average_edge_length();
    let num_vertices = mesh.num_vertices();
    let mut removed_vertices = vec![false; num_vertices];
    let mut removed_faces = vec![false; mesh.num_faces()];

    for v in 0..num_vertices {
        if v % 1024 == 0 {
            progress.report(v, num_vertices, "Coarsening");
        }
        if !mesh.vertex(v).selected || !is_eligible(mesh, v, options) {
            continue;
        }
        let Some(score) = removal_score(mesh, v, options, average_edge, &mut report) else {
            continue;
        };
        if score >= options.coarseness_rate {
            continue;
        }

        if remove_vertex(mesh, v, &mut removed_faces, &options.curvature) {
            removed_vertices[v] = true;
            report.removed += 1;
        } else {
            debug!("vertex {v} kept: its ring admits no valid triangulation");
            report.skipped += 1;
        }
    }
    progress.report(num_vertices, num_vertices, "Coarsening");

    if report.removed > 0 {
        mesh.compact(&removed_vertices, &removed_faces);
        if mesh.adjacency().is_none() {
            report.status = report.status.merge(mesh.build_adjacency().status);
        }
    }
    report.vertices_after = mesh.num_vertices();
    report.faces_after = mesh.num_faces();

    log_pass(
        options.verbose,
        format_args!(
            "coarsen: removed {} of {} vertices ({} skipped, {} flat neighborhoods), {} faces remain",
            report.removed,
            report.vertices_before,
            report.skipped,
            report.degenerate,
            report.faces_after,
        ),
    );
    Ok(report)
}
