//! Error and status types for omesh.
//!
//! Hard failures (bad construction input, coarsening an empty mesh) are
//! reported through [`MeshError`]. Everything else is soft: an offending
//! vertex, flip or eigen-solve is skipped and the outcome is summarized with
//! a [`Status`].

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A flat interop buffer does not hold whole 3-tuples.
    #[error("{buffer} buffer length {len} is not a multiple of 3")]
    InvalidBuffer {
        /// Which buffer was malformed.
        buffer: &'static str,
        /// The offending length.
        len: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Outcome of an operation that degrades gracefully instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Everything was processed normally.
    #[default]
    Ok,
    /// At least one vertex had an open or inconsistent fan and was skipped.
    NonManifoldSkipped,
    /// The eigen-solve hit a degenerate tensor and returned the default basis.
    DegenerateEigenFallback,
    /// There was nothing to process.
    EmptyInput,
}

impl Status {
    /// Returns `true` for [`Status::Ok`].
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Combine two statuses, keeping the more significant one.
    ///
    /// `EmptyInput` dominates, then `NonManifoldSkipped`, then
    /// `DegenerateEigenFallback`.
    pub fn merge(self, other: Status) -> Status {
        fn rank(s: Status) -> u8 {
            match s {
                Status::Ok => 0,
                Status::DegenerateEigenFallback => 1,
                Status::NonManifoldSkipped => 2,
                Status::EmptyInput => 3,
            }
        }
        if rank(other) > rank(self) {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_merge() {
        assert_eq!(Status::Ok.merge(Status::Ok), Status::Ok);
        assert_eq!(
            Status::Ok.merge(Status::DegenerateEigenFallback),
            Status::DegenerateEigenFallback
        );
        assert_eq!(
            Status::NonManifoldSkipped.merge(Status::DegenerateEigenFallback),
            Status::NonManifoldSkipped
        );
        assert_eq!(Status::EmptyInput.merge(Status::Ok), Status::EmptyInput);
    }

    #[test]
    fn test_error_messages() {
        let err = MeshError::InvalidVertexIndex { face: 3, vertex: 9 };
        assert_eq!(err.to_string(), "face 3 references invalid vertex index 9");

        let err = MeshError::invalid_param("coarseness_rate", -1.0, "must be non-negative");
        assert!(err.to_string().contains("coarseness_rate"));
    }
}
