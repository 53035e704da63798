//! Angle-driven mesh smoothing.
//!
//! Each iteration of [`smooth`] runs two local operations over the mesh:
//!
//! 1. [`flip_edges_around`](super::flip::flip_edges_around) for every vertex
//!    with an ordered fan, replacing diagonals that produce thin triangles;
//! 2. [`relocate_vertex`] for every selected vertex, moving it toward the
//!    position where each incident face would be equilateral.
//!
//! The relocation is damped along the principal directions of the local
//! normal tensor, so a vertex slides along the surface rather than off it.
//! Neither step is allowed to lower the smallest angle it touches, so the
//! global minimum angle never decreases from one iteration to the next.
//!
//! [`smooth_normals`] is a separate pass that reduces normal noise by
//! rotating each vertex about the edges of its fan.
//!
//! # Example
//!
//! ```
//! use omesh::mesh::primitives;
//! use omesh::algo::smooth::{smooth, SmoothOptions};
//!
//! let mut mesh = primitives::icosphere(1);
//! let report = smooth(&mut mesh, &SmoothOptions::default());
//! assert!(report.converged);
//! ```

use nalgebra::{Point3, Rotation3, Unit, Vector3};

use super::curvature::{local_structure, CurvatureOptions};
use super::flip::flip_edges_around;
use super::quality::{angle_statistics, face_angles, min_angle_of_faces, AngleStats};
use super::{log_pass, Progress};
use crate::error::Status;
use crate::mesh::SurfaceMesh;

/// Options for [`smooth`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothOptions {
    /// Target lower bound on every angle, in degrees.
    pub min_angle: f64,

    /// Target upper bound on every angle, in degrees.
    pub max_angle: f64,

    /// Maximum number of flip/relocate iterations. At least one iteration
    /// always runs.
    pub max_iterations: usize,

    /// Refuse flips across edges with a dihedral bend over about 30°.
    pub preserve_ridges: bool,

    /// Log per-iteration statistics at info level instead of debug.
    pub verbose: bool,

    /// Neighborhood used for the damping tensor.
    pub curvature: CurvatureOptions,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            min_angle: 15.0,
            max_angle: 150.0,
            max_iterations: 15,
            preserve_ridges: false,
            verbose: false,
            curvature: CurvatureOptions::default(),
        }
    }
}

impl SmoothOptions {
    /// Set the target angle range.
    pub fn with_angles(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set whether ridges are preserved during flips.
    pub fn with_preserve_ridges(mut self, preserve_ridges: bool) -> Self {
        self.preserve_ridges = preserve_ridges;
        self
    }

    /// Set verbose logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the curvature neighborhood options.
    pub fn with_curvature(mut self, curvature: CurvatureOptions) -> Self {
        self.curvature = curvature;
        self
    }
}

/// Outcome of [`smooth`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothReport {
    /// Whether every angle ended inside the target range.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
    /// Total edge flips.
    pub flips: usize,
    /// Total accepted vertex moves.
    pub moved: usize,
    /// Angle statistics after the last iteration.
    pub stats: AngleStats,
    /// Outcome of the adjacency build.
    pub status: Status,
}

/// Move `v` toward the weighted average of its equilateral targets.
///
/// For each fan face `(v, a, b)` the target is the apex of the equilateral
/// triangle over `a–b`, on the same side as `v`, weighted by
/// `1 + cos(angle at v)`. The displacement is damped by `1 / (1 + λᵢ)` along
/// each eigenvector of the local normal tensor. The move is rejected if it
/// lowers the smallest incident angle or flips an incident face.
///
/// Only vertices with a closed fan are moved. Returns whether `v` moved.
pub fn relocate_vertex(mesh: &mut SurfaceMesh, v: usize, curvature: &CurvatureOptions) -> bool {
    let Some(fan) = mesh.fan(v).filter(|fan| fan.is_closed()) else {
        return false;
    };
    let entries = fan.entries().to_vec();
    let x = *mesh.position(v);

    let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
    let mut sum = Vector3::zeros();
    let mut total = 0.0;
    for e in &entries {
        let p = mesh.position(e.a);
        let q = mesh.position(e.b);
        let edge = q - p;
        let len2 = edge.norm_squared();
        if len2 <= f64::EPSILON {
            continue;
        }

        let mid = Point3::from((p.coords + q.coords) * 0.5);
        let d = x - mid;
        let dir = d - edge * (d.dot(&edge) / len2);
        let dir_len = dir.norm();
        if dir_len <= f64::EPSILON {
            continue;
        }
        let target = mid + dir * (half_sqrt3 * len2.sqrt() / dir_len);

        let Some(angle) = face_angles(&x, p, q)[0] else {
            continue;
        };
        let weight = 1.0 + angle.to_radians().cos();
        sum += target.coords * weight;
        total += weight;
    }
    if total <= f64::EPSILON {
        return false;
    }

    let mut displacement = sum / total - x.coords;
    let local = local_structure(mesh, v, curvature);
    if !local.is_degenerate() {
        let mut damped = Vector3::zeros();
        for i in 0..3 {
            let axis = local.eigenvector(i);
            damped += axis * (displacement.dot(&axis) / (1.0 + local.values[i]));
        }
        displacement = damped;
    }
    if displacement.norm_squared() <= f64::EPSILON * f64::EPSILON {
        return false;
    }

    let faces: Vec<usize> = entries.iter().map(|e| e.face).collect();
    let old_normals: Vec<Vector3<f64>> = faces.iter().map(|&f| raw_normal(mesh, f)).collect();
    let old_min = min_angle_of_faces(mesh, faces.iter().copied());

    mesh.set_position(v, x + displacement);

    let inverted = faces
        .iter()
        .zip(&old_normals)
        .any(|(&f, n)| raw_normal(mesh, f).dot(n) <= 0.0);
    let new_min = min_angle_of_faces(mesh, faces.iter().copied());
    if inverted || new_min < old_min {
        mesh.set_position(v, x);
        return false;
    }
    true
}

fn raw_normal(mesh: &SurfaceMesh, f: usize) -> Vector3<f64> {
    let [p0, p1, p2] = mesh.face_positions(f);
    (p1 - p0).cross(&(p2 - p0))
}

/// Improve triangle angles by alternating edge flips and vertex relocation.
///
/// Builds the adjacency if needed. Runs until every angle lies strictly
/// inside `(min_angle, max_angle)` or `max_iterations` is reached.
pub fn smooth(mesh: &mut SurfaceMesh, options: &SmoothOptions) -> SmoothReport {
    smooth_with_progress(mesh, options, &Progress::none())
}

/// [`smooth`] with progress reporting.
pub fn smooth_with_progress(
    mesh: &mut SurfaceMesh,
    options: &SmoothOptions,
    progress: &Progress,
) -> SmoothReport {
    let mut report = SmoothReport {
        status: mesh.ensure_adjacency(),
        ..Default::default()
    };
    if mesh.num_faces() == 0 {
        report.status = Status::EmptyInput;
        return report;
    }

    let max_iterations = options.max_iterations.max(1);
    loop {
        progress.report(report.iterations, max_iterations, "Smoothing");
        report.iterations += 1;

        let mut flips = 0;
        for v in 0..mesh.num_vertices() {
            flips += flip_edges_around(mesh, v, options.preserve_ridges);
        }

        let mut moved = 0;
        for v in 0..mesh.num_vertices() {
            if mesh.vertex(v).selected && relocate_vertex(mesh, v, &options.curvature) {
                moved += 1;
            }
        }

        report.flips += flips;
        report.moved += moved;
        report.stats = angle_statistics(mesh, options.min_angle, options.max_angle);
        log_pass(
            options.verbose,
            format_args!(
                "smooth iteration {}: {} flips, {} moves, angles [{:.2}, {:.2}], {} below {}, {} above {}",
                report.iterations,
                flips,
                moved,
                report.stats.min,
                report.stats.max,
                report.stats.below,
                options.min_angle,
                report.stats.above,
                options.max_angle,
            ),
        );

        if report.stats.within(options.min_angle, options.max_angle) {
            report.converged = true;
            break;
        }
        if report.iterations >= max_iterations {
            break;
        }
    }

    progress.report(max_iterations, max_iterations, "Smoothing");
    report
}

// ============================================================================
// Normal smoothing
// ============================================================================

/// Options for [`smooth_normals`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalSmoothOptions {
    /// A move may not push the smallest incident angle below this (degrees)
    /// unless it was already lower.
    pub min_angle: f64,

    /// A move may not push the largest incident angle above this (degrees)
    /// unless it was already higher.
    pub max_angle: f64,

    /// Log the summary at info level instead of debug.
    pub verbose: bool,
}

impl Default for NormalSmoothOptions {
    fn default() -> Self {
        Self {
            min_angle: 15.0,
            max_angle: 150.0,
            verbose: false,
        }
    }
}

impl NormalSmoothOptions {
    /// Set the angle guard range.
    pub fn with_angles(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    /// Set verbose logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of [`smooth_normals`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalSmoothReport {
    /// Vertices moved.
    pub moved: usize,
    /// Selected vertices skipped because their fan is not closed.
    pub skipped: usize,
    /// Angle statistics after the pass.
    pub stats: AngleStats,
    /// Outcome of the adjacency build.
    pub status: Status,
}

fn angle_range(mesh: &SurfaceMesh, faces: &[usize]) -> (f64, f64) {
    let mut min = 180.0_f64;
    let mut max = 0.0_f64;
    for &f in faces {
        let [p0, p1, p2] = mesh.face_positions(f);
        for angle in face_angles(&p0, &p1, &p2).into_iter().flatten() {
            min = min.min(angle);
            max = max.max(angle);
        }
    }
    (min, max)
}

/// Position of `v` after rotating each fan face about its far edge so that
/// its normal matches the mean of its two fan neighbors.
fn normal_target(mesh: &SurfaceMesh, v: usize) -> Option<Point3<f64>> {
    let fan = mesh.fan(v)?;
    let entries = fan.entries();
    let n = entries.len();
    let x = *mesh.position(v);

    let normals: Vec<Vector3<f64>> = entries.iter().map(|e| mesh.face_normal(e.face)).collect();
    let mut sum = Vector3::zeros();
    let mut count = 0;
    for (i, e) in entries.iter().enumerate() {
        let a = mesh.position(e.a);
        let Some(axis) = Unit::try_new(mesh.position(e.b) - a, f64::EPSILON) else {
            continue;
        };

        let target = normals[(i + n - 1) % n] + normals[(i + 1) % n];
        let target = target - axis.into_inner() * axis.dot(&target);
        if target.norm_squared() <= f64::EPSILON {
            continue;
        }
        let normal = normals[i];
        let angle = axis.dot(&normal.cross(&target)).atan2(normal.dot(&target));

        let rotation = Rotation3::from_axis_angle(&axis, angle);
        sum += a.coords + rotation * (x - a);
        count += 1;
    }

    (count > 0).then(|| Point3::from(sum / count as f64))
}

/// Reduce normal noise by rotating each selected vertex about its fan edges.
///
/// Vertices whose fan is open or broken are skipped. A move is rejected if
/// it flips an incident face or pushes an incident angle out of the guard
/// range further than it already was.
pub fn smooth_normals(mesh: &mut SurfaceMesh, options: &NormalSmoothOptions) -> NormalSmoothReport {
    let mut report = NormalSmoothReport {
        status: mesh.ensure_adjacency(),
        ..Default::default()
    };
    if mesh.num_faces() == 0 {
        report.status = Status::EmptyInput;
        return report;
    }

    for v in 0..mesh.num_vertices() {
        if !mesh.vertex(v).selected {
            continue;
        }
        let faces: Vec<usize> = match mesh.fan(v) {
            Some(fan) if fan.is_closed() => fan.faces().collect(),
            _ => {
                log::debug!("normal smoothing skipped vertex {v}: fan is not closed");
                report.skipped += 1;
                continue;
            }
        };
        let Some(target) = normal_target(mesh, v) else {
            continue;
        };

        let x = *mesh.position(v);
        let old_normals: Vec<Vector3<f64>> = faces.iter().map(|&f| raw_normal(mesh, f)).collect();
        let (old_min, old_max) = angle_range(mesh, &faces);

        mesh.set_position(v, target);

        let inverted = faces
            .iter()
            .zip(&old_normals)
            .any(|(&f, n)| raw_normal(mesh, f).dot(n) <= 0.0);
        let (new_min, new_max) = angle_range(mesh, &faces);
        if inverted
            || new_min < options.min_angle.min(old_min)
            || new_max > options.max_angle.max(old_max)
        {
            mesh.set_position(v, x);
        } else {
            report.moved += 1;
        }
    }

    report.stats = angle_statistics(mesh, options.min_angle, options.max_angle);
    log_pass(
        options.verbose,
        format_args!(
            "normal smoothing: {} moved, {} skipped, angles [{:.2}, {:.2}]",
            report.moved, report.skipped, report.stats.min, report.stats.max
        ),
    );
    report
}
