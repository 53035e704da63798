//! One-call optimization entry points on [`SurfaceMesh`].
//!
//! These methods wrap the option-based functions in [`smooth`](super::smooth),
//! [`decimate`](super::decimate) and [`subdivide`](super::subdivide) with
//! positional parameters, and provide the default optimization recipe.
//!
//! # Example
//!
//! ```
//! use omesh::mesh::primitives;
//!
//! let mut mesh = primitives::icosphere(2);
//! let converged = mesh.optimize_using_default_parameters().unwrap();
//! assert!(converged);
//! ```

use super::decimate::{coarsen, coarsen_repeated, CoarsenOptions, CoarsenReport};
use super::smooth::{smooth, smooth_normals, NormalSmoothOptions, SmoothOptions};
use super::subdivide::refine;
use crate::error::{Result, Status};
use crate::mesh::SurfaceMesh;

impl SurfaceMesh {
    /// Flip edges and relocate vertices until every angle lies inside
    /// `(min_angle, max_angle)` or `max_iterations` is reached.
    ///
    /// Returns whether the angle bounds were met.
    pub fn smooth(
        &mut self,
        min_angle: f64,
        max_angle: f64,
        max_iterations: usize,
        preserve_ridges: bool,
        verbose: bool,
    ) -> bool {
        let options = SmoothOptions::default()
            .with_angles(min_angle, max_angle)
            .with_max_iterations(max_iterations)
            .with_preserve_ridges(preserve_ridges)
            .with_verbose(verbose);
        smooth(self, &options).converged
    }

    /// Run one pass of normal smoothing.
    pub fn smooth_normals(&mut self, min_angle: f64, max_angle: f64, verbose: bool) -> Status {
        let options = NormalSmoothOptions::default()
            .with_angles(min_angle, max_angle)
            .with_verbose(verbose);
        smooth_normals(self, &options).status
    }

    /// Run one coarsening pass.
    ///
    /// Returns `true` when the pass removed nothing.
    pub fn coarse(
        &mut self,
        coarseness_rate: f64,
        flatness_rate: f64,
        denseness_weight: f64,
        max_normal_angle: Option<f64>,
        verbose: bool,
    ) -> Result<bool> {
        let mut options = CoarsenOptions::new(coarseness_rate, flatness_rate, denseness_weight)
            .with_verbose(verbose);
        options.max_normal_angle = max_normal_angle;
        Ok(coarsen(self, &options)?.stopped())
    }

    /// Repeat dense-region coarsening up to `iterations` times.
    pub fn coarse_dense(&mut self, rate: f64, iterations: usize, verbose: bool) -> Result<CoarsenReport> {
        coarsen_repeated(self, &CoarsenOptions::dense(rate).with_verbose(verbose), iterations)
    }

    /// Repeat flat-region coarsening up to `iterations` times.
    pub fn coarse_flat(&mut self, rate: f64, iterations: usize, verbose: bool) -> Result<CoarsenReport> {
        coarsen_repeated(self, &CoarsenOptions::flat(rate).with_verbose(verbose), iterations)
    }

    /// Replace the mesh with its 1-to-4 midpoint refinement.
    pub fn refine(&mut self) {
        *self = refine(self);
    }

    /// Coarsen flat regions, then smooth.
    ///
    /// Equivalent to `coarse_flat(0.05, 5)` followed by
    /// `smooth(15, 150, 15, false)`. Returns whether smoothing converged.
    pub fn optimize_using_default_parameters(&mut self) -> Result<bool> {
        self.coarse_flat(0.05, 5, false)?;
        Ok(self.smooth(15.0, 150.0, 15, false, false))
    }
}
