//! # omesh
//!
//! Quality optimization for triangulated surface meshes.
//!
//! omesh takes a triangle surface, typically extracted from imaging or
//! morphology data, and improves it for downstream simulation: it removes
//! vertices where the surface is flat or oversampled, flips and relocates to
//! eliminate thin triangles, smooths normal noise, and refines uniformly.
//!
//! ## Features
//!
//! - **Fan adjacency**: per-vertex counter-clockwise face rings kept in plain
//!   vectors and patched locally as the topology changes
//! - **Curvature**: closed-form eigen-analysis of the local normal tensor
//! - **Smoothing**: angle-improving edge flips and vertex relocation with a
//!   monotone minimum angle
//! - **Coarsening**: flatness- and density-driven vertex removal
//! - **Refinement**: uniform 1-to-4 midpoint subdivision
//!
//! ## Quick Start
//!
//! ```
//! use omesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let triangles = vec![
//!     [0, 2, 1], // bottom
//!     [0, 1, 3], // front
//!     [1, 2, 3], // right
//!     [2, 0, 3], // left
//! ];
//!
//! let mut mesh = SurfaceMesh::from_triangles(&positions, &triangles).unwrap();
//! mesh.refine();
//! assert_eq!(mesh.num_vertices(), 10);
//! assert_eq!(mesh.num_faces(), 16);
//!
//! let converged = mesh.smooth(15.0, 150.0, 10, false, false);
//! let stats = angle_statistics(&mesh, 15.0, 150.0);
//! assert_eq!(converged, stats.within(15.0, 150.0));
//! ```
//!
//! ## Fans
//!
//! ```
//! use omesh::prelude::*;
//!
//! let mut mesh = omesh::mesh::primitives::icosahedron();
//! mesh.build_adjacency();
//!
//! let fan = mesh.fan(0).unwrap();
//! assert!(fan.is_closed());
//! for pair in fan.entries().windows(2) {
//!     assert_eq!(pair[0].b, pair[1].a);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use omesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::decimate::{coarsen, CoarsenOptions, CoarsenReport};
    pub use crate::algo::quality::{angle_statistics, AngleStats};
    pub use crate::algo::smooth::{smooth, smooth_normals, NormalSmoothOptions, SmoothOptions, SmoothReport};
    pub use crate::algo::subdivide::refine;
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result, Status};
    pub use crate::mesh::{Adjacency, Face, Fan, FanEntry, FanShape, IndexRemap, SurfaceMesh, Vertex};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
