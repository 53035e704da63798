//! Mesh optimization algorithms.
//!
//! - **Curvature**: local normal-tensor eigen-analysis ([`curvature`])
//! - **Quality**: triangle angle statistics ([`quality`])
//! - **Smoothing**: edge flips, angle-driven relocation and normal smoothing
//!   ([`smooth`], [`flip`])
//! - **Decimation**: vertex-removal coarsening ([`decimate`])
//! - **Subdivision**: uniform midpoint refinement ([`subdivide`])
//!
//! [`pipeline`] adds positional-parameter entry points on
//! [`SurfaceMesh`](crate::mesh::SurfaceMesh) and the default recipe.

pub mod curvature;
pub mod decimate;
pub mod flip;
pub mod pipeline;
pub mod progress;
pub mod quality;
pub mod smooth;
pub mod subdivide;

pub use progress::Progress;

/// Log a pass summary at info level when `verbose`, debug otherwise.
pub(crate) fn log_pass(verbose: bool, args: std::fmt::Arguments<'_>) {
    let level = if verbose { log::Level::Info } else { log::Level::Debug };
    log::log!(level, "{}", args);
}
