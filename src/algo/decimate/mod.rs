//! Mesh coarsening by vertex removal.
//!
//! A pass visits every selected vertex once. A vertex is removed when its
//! neighborhood is flat, sparse, or both, as measured by
//!
//! ```text
//! ratio1 = |λ₂ / λ₁| ^ flatness_rate
//! ratio2 = (longest incident edge / average edge length) ^ denseness_weight
//! ```
//!
//! where `λ₁ ≥ λ₂` are the two largest eigenvalues of the local normal tensor
//! (see [`curvature`](super::curvature)). The vertex goes when
//! `ratio1 · ratio2 < coarseness_rate`. Its star is re-triangulated in place,
//! the surrounding ring is relaxed, and the arrays are compacted once at the
//! end of the pass.
//!
//! Removal is restricted to vertices whose neighbors are not connected to
//! each other through more than `shared_neighbor_limit` common neighbors and
//! all have valence above `min_neighbor_valence`; this keeps the surface
//! manifold.
//!
//! # Example
//!
//! ```
//! use omesh::mesh::primitives;
//! use omesh::algo::decimate::coarsen_flat;
//!
//! let mut mesh = primitives::grid(8);
//! mesh.build_adjacency();
//! let before = mesh.num_vertices();
//!
//! let report = coarsen_flat(&mut mesh, 0.05, 3).unwrap();
//! assert!(report.removed > 0);
//! assert!(mesh.num_vertices() < before);
//! ```

mod coarsen;
mod polygon;

pub use polygon::subdivide_polygon;

use super::curvature::CurvatureOptions;
use super::Progress;
use crate::error::{MeshError, Result, Status};
use crate::mesh::SurfaceMesh;

/// Options for [`coarsen`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoarsenOptions {
    /// A vertex is removed when its score falls below this value.
    pub coarseness_rate: f64,

    /// Exponent on the flatness ratio (0 disables the flatness criterion).
    pub flatness_rate: f64,

    /// Exponent on the edge length ratio (0 disables the sparseness criterion).
    pub denseness_weight: f64,

    /// Keep any vertex whose neighborhood normals deviate from its own by
    /// more than this many degrees.
    pub max_normal_angle: Option<f64>,

    /// Largest number of neighbors a ring vertex may share with the removed
    /// vertex.
    pub shared_neighbor_limit: usize,

    /// Every ring vertex must have a valence strictly above this.
    pub min_neighbor_valence: usize,

    /// Neighborhood used for the normal tensor.
    pub curvature: CurvatureOptions,

    /// Log the pass summary at info level instead of debug.
    pub verbose: bool,
}

impl Default for CoarsenOptions {
    fn default() -> Self {
        Self {
            coarseness_rate: 0.05,
            flatness_rate: 1.0,
            denseness_weight: 0.0,
            max_normal_angle: None,
            shared_neighbor_limit: 2,
            min_neighbor_valence: 3,
            curvature: CurvatureOptions::default(),
            verbose: false,
        }
    }
}

impl CoarsenOptions {
    /// Options with the given rate and exponents.
    pub fn new(coarseness_rate: f64, flatness_rate: f64, denseness_weight: f64) -> Self {
        Self {
            coarseness_rate,
            flatness_rate,
            denseness_weight,
            ..Default::default()
        }
    }

    /// Options for removing vertices in densely sampled regions.
    pub fn dense(coarseness_rate: f64) -> Self {
        Self::new(coarseness_rate, 0.0, 10.0)
    }

    /// Options for removing vertices in flat regions.
    pub fn flat(coarseness_rate: f64) -> Self {
        Self::new(coarseness_rate, 1.0, 0.0)
    }

    /// Keep vertices on features sharper than `degrees`.
    pub fn with_max_normal_angle(mut self, degrees: f64) -> Self {
        self.max_normal_angle = Some(degrees);
        self
    }

    /// Set the eligibility thresholds.
    pub fn with_eligibility(mut self, shared_neighbor_limit: usize, min_neighbor_valence: usize) -> Self {
        self.shared_neighbor_limit = shared_neighbor_limit;
        self.min_neighbor_valence = min_neighbor_valence;
        self
    }

    /// Set the curvature neighborhood options.
    pub fn with_curvature(mut self, curvature: CurvatureOptions) -> Self {
        self.curvature = curvature;
        self
    }

    /// Set verbose logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.coarseness_rate.is_finite() || self.coarseness_rate < 0.0 {
            return Err(MeshError::invalid_param(
                "coarseness_rate",
                self.coarseness_rate,
                "must be finite and non-negative",
            ));
        }
        if !self.flatness_rate.is_finite() || self.flatness_rate < 0.0 {
            return Err(MeshError::invalid_param(
                "flatness_rate",
                self.flatness_rate,
                "must be finite and non-negative",
            ));
        }
        if !self.denseness_weight.is_finite() || self.denseness_weight < 0.0 {
            return Err(MeshError::invalid_param(
                "denseness_weight",
                self.denseness_weight,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Outcome of one or more coarsening passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarsenReport {
    /// Vertices removed.
    pub removed: usize,
    /// Vertices that qualified but whose ring could not be triangulated.
    pub skipped: usize,
    /// Neighborhoods that fell back to the default eigenbasis.
    pub degenerate: usize,
    /// Passes run.
    pub passes: usize,
    /// Vertex count before the first pass.
    pub vertices_before: usize,
    /// Vertex count after the last pass.
    pub vertices_after: usize,
    /// Face count after the last pass.
    pub faces_after: usize,
    /// Combined soft-failure status.
    pub status: Status,
}

impl CoarsenReport {
    /// Whether no vertex was removed.
    pub fn stopped(&self) -> bool {
        self.removed == 0
    }

    fn absorb(&mut self, pass: CoarsenReport) {
        if self.passes == 0 {
            self.vertices_before = pass.vertices_before;
        }
        self.removed += pass.removed;
        self.skipped += pass.skipped;
        self.degenerate += pass.degenerate;
        self.passes += 1;
        self.vertices_after = pass.vertices_after;
        self.faces_after = pass.faces_after;
        self.status = self.status.merge(pass.status);
    }
}

/// Run one coarsening pass.
///
/// Builds the adjacency if needed. Returns [`MeshError::EmptyMesh`] for a
/// mesh without faces.
pub fn coarsen(mesh: &mut SurfaceMesh, options: &CoarsenOptions) -> Result<CoarsenReport> {
    coarsen_with_progress(mesh, options, &Progress::none())
}

/// [`coarsen`] with progress reporting.
pub fn coarsen_with_progress(
    mesh: &mut SurfaceMesh,
    options: &CoarsenOptions,
    progress: &Progress,
) -> Result<CoarsenReport> {
    let mut report = coarsen::coarsen_pass(mesh, options, progress)?;
    report.passes = 1;
    Ok(report)
}

/// Repeat [`coarsen`] up to `iterations` times, stopping early once a pass
/// removes nothing.
///
/// A mesh without faces is rejected even when no pass would run.
pub fn coarsen_repeated(
    mesh: &mut SurfaceMesh,
    options: &CoarsenOptions,
    iterations: usize,
) -> Result<CoarsenReport> {
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }
    let mut total = CoarsenReport {
        vertices_before: mesh.num_vertices(),
        vertices_after: mesh.num_vertices(),
        faces_after: mesh.num_faces(),
        ..Default::default()
    };
    for _ in 0..iterations {
        let pass = coarsen::coarsen_pass(mesh, options, &Progress::none())?;
        let done = pass.stopped();
        total.absorb(pass);
        if done {
            break;
        }
    }
    Ok(total)
}

/// Remove vertices where the mesh is denser than average.
pub fn coarsen_dense(mesh: &mut SurfaceMesh, rate: f64, iterations: usize) -> Result<CoarsenReport> {
    coarsen_repeated(mesh, &CoarsenOptions::dense(rate), iterations)
}

/// Remove vertices in flat regions.
pub fn coarsen_flat(mesh: &mut SurfaceMesh, rate: f64, iterations: usize) -> Result<CoarsenReport> {
    coarsen_repeated(mesh, &CoarsenOptions::flat(rate), iterations)
}
