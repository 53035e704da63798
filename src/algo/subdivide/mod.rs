//! Uniform mesh refinement.
//!
//! Every edge receives one midpoint vertex and every triangle is split into
//! four: one inner triangle joining the three midpoints and three corner
//! triangles. Positions are not smoothed, so the refined surface is the same
//! piecewise-linear surface as the input.
//!
//! Shared midpoints are resolved through a flat edge table indexed by each
//! edge's lower endpoint (an offset array), so no hashing is involved.
//!
//! # Example
//!
//! ```
//! use omesh::mesh::primitives;
//! use omesh::algo::subdivide::refine;
//!
//! let mesh = primitives::icosahedron();
//! let refined = refine(&mesh);
//! assert_eq!(refined.num_vertices(), 42);
//! assert_eq!(refined.num_faces(), 80);
//! ```

mod midpoint;

pub use midpoint::{refine, refine_with_progress};
