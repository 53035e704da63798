//! Core mesh data structures.
//!
//! This module provides the indexed triangle surface and the per-vertex fan
//! adjacency the optimization passes work on.
//!
//! # Overview
//!
//! [`SurfaceMesh`] owns a vertex array, a face array and its domain
//! metadata. The [`Adjacency`] is built lazily: every vertex gets a [`Fan`],
//! the counter-clockwise ring of its incident triangles. Passes that change
//! the topology either patch the affected fans or drop the adjacency so it
//! is rebuilt on next use.
//!
//! # Construction
//!
//! ```
//! use omesh::mesh::SurfaceMesh;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mut mesh = SurfaceMesh::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
//! mesh.build_adjacency();
//! assert_eq!(mesh.fan(0).unwrap().len(), 1);
//! ```

mod adjacency;
mod builder;
pub mod primitives;
mod surface;

pub use adjacency::{Adjacency, AdjacencyReport, Fan, FanEntry, FanShape};
pub use surface::{DomainInfo, Face, IndexRemap, SurfaceMesh, Vertex};
