//! Progress reporting for long-running algorithms.
//!
//! Smoothing, coarsening and repeated refinement accept a [`Progress`] in
//! their `_with_progress` variants and report one step per iteration or per
//! block of vertices.
//!
//! # Example
//!
//! ```
//! use omesh::algo::progress::Progress;
//! use omesh::algo::smooth::{smooth_with_progress, SmoothOptions};
//! use omesh::mesh::primitives;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//!
//! let mut mesh = primitives::icosphere(1);
//! smooth_with_progress(&mut mesh, &SmoothOptions::default(), &progress);
//! ```

/// Callback invoked as `(current, total, message)` while a pass advances.
///
/// `current` counts from 0; a final call with `current == total` marks the
/// end of the pass.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// A reporter that ignores every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
